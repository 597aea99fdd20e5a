//! Core retrieval modules

pub mod math;
pub mod aux_tables;
pub mod neural_net;
pub mod solar_irradiance;
pub mod water_vapour;
pub mod transmission;
pub mod solar_part;
pub mod geometric_conversion;
pub mod ambiguity;
pub mod preparation;
pub mod azimuth_correction;
pub mod pipeline;

// Re-export main types
pub use aux_tables::{
    AuxTables, KDistributionSet, KDistributionTerm, SolarReferenceTable, SpectralResponseTable,
    TempRadianceTable,
};
pub use neural_net::{Activation, DenseLayer, FeedForwardNet, NeuralSurrogate};
pub use solar_irradiance::{day_of_year, day_of_year_from_compact, SolarIrradianceCalculator};
pub use water_vapour::WaterVapourEstimator;
pub use transmission::TransmissionModel;
pub use solar_part::ThermalSolarSeparator;
pub use geometric_conversion::{gauss2d, GaussianParams, GeometricConverter, RadianceLut};
pub use ambiguity::AmbiguityResolver;
pub use preparation::{azimuth_difference, is_useful_pixel};
pub use azimuth_correction::AzimuthCorrector;
pub use pipeline::{PixelDiagnostics, PixelPipeline, SceneProcessor};
