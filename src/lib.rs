//! FLINT: sun-glint and effective wind speed retrieval from co-located MERIS/AATSR data
//!
//! The AATSR 3.7 µm measurement is corrected for atmospheric transmission and
//! thermal emission, and the remaining solar (glint) part is converted to MERIS
//! observation geometry through a windspeed lookup table built from a neural
//! surrogate of a 2-D Gaussian glint model.
//!
//! Tables are loaded once into an [`AuxTables`] bundle and shared through `Arc`;
//! neural surrogates are owned by a [`PixelPipeline`] and duplicated per worker.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    Channel, FlintError, FlintParams, FlintResult, GasTerm, LutCandidates, PixelObservation,
    RangeCheck, RetrievalResult, WindRadiance, NO_RESULT,
};

pub use crate::core::{
    AuxTables, AzimuthCorrector, FeedForwardNet, NeuralSurrogate, PixelDiagnostics,
    PixelPipeline, SceneProcessor,
};

pub use io::AuxDataReader;
