//! Per-pixel retrieval pipeline and scene processing
//!
//! Per pixel: water vapour, transmissions, thermal/solar separation,
//! geometric conversion, ambiguity resolution. The solar irradiance is
//! computed once when the pipeline is built; the view azimuth correction runs
//! once per scene before any pixel is retrieved.

use crate::core::ambiguity::AmbiguityResolver;
use crate::core::aux_tables::AuxTables;
use crate::core::azimuth_correction::AzimuthCorrector;
use crate::core::geometric_conversion::GeometricConverter;
use crate::core::neural_net::NeuralSurrogate;
use crate::core::preparation::{azimuth_difference, is_useful_observation};
use crate::core::solar_irradiance::SolarIrradianceCalculator;
use crate::core::solar_part::ThermalSolarSeparator;
use crate::core::transmission::TransmissionModel;
use crate::core::water_vapour::WaterVapourEstimator;
use crate::types::{
    Channel, FlintError, FlintParams, FlintResult, LutCandidates, PixelObservation,
    RetrievalResult,
};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Every intermediate quantity of one pixel retrieval
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelDiagnostics {
    /// g/cm²
    pub water_vapour: f64,
    pub transmission_37: f64,
    pub transmission_16: f64,
    /// Measured 3.7 µm radiance normalized by the solar irradiance
    pub radiance_37: f64,
    pub thermal_bt_37: f64,
    pub thermal_radiance_37: f64,
    /// 1/sr
    pub solar_part_37: f64,
    /// %
    pub solar_part_37_units: f64,
    pub specular_reflectance_16: f64,
    /// Specular reflectance divided by the cloud specular divisor
    pub specular_reflectance_16_scaled: f64,
    pub additional_cloud: bool,
    pub candidates: LutCandidates,
    pub windspeeds_found: usize,
    pub result: RetrievalResult,
}

/// The full retrieval for single pixels.
///
/// A pipeline owns its neural surrogates; use [`PixelPipeline::duplicate`]
/// to obtain an independent copy for every concurrent worker.
pub struct PixelPipeline {
    tables: Arc<AuxTables>,
    params: FlintParams,
    solar_irradiance_37: f64,
    water_vapour: WaterVapourEstimator,
    transmission: TransmissionModel,
    separator: ThermalSolarSeparator,
    converter: GeometricConverter,
    resolver: AmbiguityResolver,
}

impl PixelPipeline {
    /// Build a pipeline for a scene acquired on `day_of_year`
    pub fn new(
        tables: Arc<AuxTables>,
        water_vapour_net: Box<dyn NeuralSurrogate>,
        windspeed_net: Box<dyn NeuralSurrogate>,
        params: FlintParams,
        day_of_year: u32,
    ) -> FlintResult<Self> {
        let irradiance = SolarIrradianceCalculator::new(Arc::clone(&tables))
            .compute_solar_irradiance(day_of_year);
        Self::with_solar_irradiance(tables, water_vapour_net, windspeed_net, params, irradiance)
    }

    /// Build a pipeline with a precomputed 3.7 µm solar irradiance
    pub fn with_solar_irradiance(
        tables: Arc<AuxTables>,
        water_vapour_net: Box<dyn NeuralSurrogate>,
        windspeed_net: Box<dyn NeuralSurrogate>,
        params: FlintParams,
        solar_irradiance_37: f64,
    ) -> FlintResult<Self> {
        params.validate()?;
        if !(solar_irradiance_37 > 0.0) {
            return Err(FlintError::InvalidParameter(format!(
                "solar irradiance must be positive, got {}",
                solar_irradiance_37
            )));
        }

        let water_vapour = WaterVapourEstimator::new(water_vapour_net, &params)?;
        let converter = GeometricConverter::new(windspeed_net, &params)?;
        let transmission = TransmissionModel::new(Arc::clone(&tables), params.water_vapour_reference);
        let separator = ThermalSolarSeparator::new(Arc::clone(&tables), &params);

        log::debug!("Pixel pipeline ready, solar irradiance {:.4}", solar_irradiance_37);

        Ok(Self {
            tables,
            params,
            solar_irradiance_37,
            water_vapour,
            transmission,
            separator,
            converter,
            resolver: AmbiguityResolver::new(),
        })
    }

    /// Independent pipeline sharing the tables, with its own surrogate copies
    pub fn duplicate(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            params: self.params.clone(),
            solar_irradiance_37: self.solar_irradiance_37,
            water_vapour: self.water_vapour.duplicate(),
            transmission: self.transmission.clone(),
            separator: self.separator.clone(),
            converter: self.converter.duplicate(),
            resolver: self.resolver,
        }
    }

    pub fn params(&self) -> &FlintParams {
        &self.params
    }

    pub fn tables(&self) -> &Arc<AuxTables> {
        &self.tables
    }

    pub fn solar_irradiance_37(&self) -> f64 {
        self.solar_irradiance_37
    }

    pub fn is_useful(&self, observation: &PixelObservation) -> bool {
        is_useful_observation(observation, self.params.min_bt_37)
    }

    /// Final (windspeed, radiance) outcome for one pixel
    pub fn retrieve(&mut self, observation: &PixelObservation) -> FlintResult<RetrievalResult> {
        Ok(self.retrieve_detailed(observation)?.result)
    }

    /// Retrieval with all intermediate quantities
    pub fn retrieve_detailed(
        &mut self,
        observation: &PixelObservation,
    ) -> FlintResult<PixelDiagnostics> {
        let mut diag = PixelDiagnostics::default();
        if !self.is_useful(observation) {
            return Ok(diag);
        }
        let obs = observation;

        // thermal part of the 3.7 µm signal
        diag.thermal_bt_37 = self.separator.extrapolate_to_37(obs.aatsr_bt_11, obs.aatsr_bt_12);

        let meris_azd = azimuth_difference(obs.meris_view_azimuth, obs.meris_sun_azimuth);
        diag.water_vapour = self.water_vapour.compute_water_vapour(
            obs.zonal_wind,
            obs.meridional_wind,
            meris_azd,
            obs.meris_view_zenith,
            obs.meris_sun_zenith,
            obs.meris_radiance_14,
            obs.meris_radiance_15,
        )?;

        let sun_zenith = 90.0 - obs.aatsr_sun_elevation;
        let view_zenith = 90.0 - obs.aatsr_view_elevation;
        diag.transmission_37 =
            self.transmission
                .transmission(Channel::Ir37, diag.water_vapour, sun_zenith, view_zenith);
        diag.transmission_16 =
            self.transmission
                .transmission(Channel::Ir16, diag.water_vapour, sun_zenith, view_zenith);

        diag.radiance_37 = self.separator.bt_to_radiance(obs.aatsr_bt_37) / self.solar_irradiance_37;
        diag.thermal_radiance_37 =
            self.separator.bt_to_radiance(diag.thermal_bt_37) / self.solar_irradiance_37;

        diag.solar_part_37 = ThermalSolarSeparator::compute_solar_part(
            diag.radiance_37,
            diag.thermal_radiance_37,
            diag.transmission_37,
        );
        diag.solar_part_37_units =
            ThermalSolarSeparator::to_instrument_units(diag.solar_part_37, obs.aatsr_sun_elevation);

        diag.specular_reflectance_16 =
            ThermalSolarSeparator::specular_reflectance(obs.aatsr_reflectance_16, diag.transmission_16);
        diag.specular_reflectance_16_scaled =
            diag.specular_reflectance_16 / self.params.cloud_specular_divisor;
        diag.additional_cloud = self
            .separator
            .is_additional_cloud(diag.specular_reflectance_16, diag.solar_part_37_units);

        if self.params.additional_cloud_mask && diag.additional_cloud {
            diag.result = RetrievalResult::CloudMasked;
            return Ok(diag);
        }

        let aatsr_azd = azimuth_difference(obs.aatsr_view_azimuth, obs.aatsr_sun_azimuth);
        diag.candidates = self.converter.convert(
            diag.solar_part_37,
            obs.meris_sun_zenith,
            obs.meris_view_zenith,
            180.0 - aatsr_azd,
            180.0 - meris_azd,
        )?;
        diag.windspeeds_found = diag.candidates.windspeeds_found();

        diag.result = if diag.windspeeds_found > 0 {
            RetrievalResult::Retrieved(
                self.resolver
                    .resolve_field(&diag.candidates, obs.field_windspeed()),
            )
        } else {
            RetrievalResult::NoSolution
        };

        log::trace!(
            "wv {:.3}, t37 {:.4}, solar part {:.6}, {} windspeed(s), {:?}",
            diag.water_vapour,
            diag.transmission_37,
            diag.solar_part_37,
            diag.windspeeds_found,
            diag.result
        );
        Ok(diag)
    }
}

/// Runs a pixel pipeline over a whole scene
pub struct SceneProcessor {
    pipeline: PixelPipeline,
    corrector: AzimuthCorrector,
}

impl SceneProcessor {
    pub fn new(pipeline: PixelPipeline) -> Self {
        let corrector = AzimuthCorrector::new(pipeline.params());
        Self {
            pipeline,
            corrector,
        }
    }

    pub fn pipeline(&self) -> &PixelPipeline {
        &self.pipeline
    }

    /// Copy of the scene with corrected MERIS and AATSR view azimuths
    pub fn prepare_scene(&self, scene: &Array2<PixelObservation>) -> Array2<PixelObservation> {
        let mut prepared = scene.clone();
        if !self.pipeline.params().correct_view_azimuth {
            return prepared;
        }

        let mut meris = scene.mapv(|o| o.meris_view_azimuth);
        let mut aatsr = scene.mapv(|o| o.aatsr_view_azimuth);
        self.corrector.correct_view_azimuth_raster(&mut meris);
        self.corrector.correct_view_azimuth_raster(&mut aatsr);

        ndarray::Zip::from(&mut prepared)
            .and(&meris)
            .and(&aatsr)
            .for_each(|o, &m, &a| {
                o.meris_view_azimuth = m;
                o.aatsr_view_azimuth = a;
            });
        prepared
    }

    /// Retrieve every pixel of a scene.
    ///
    /// `cancel` is polled before each row; once raised the run stops with
    /// [`FlintError::Cancelled`].
    pub fn process(
        &self,
        scene: &Array2<PixelObservation>,
        cancel: Option<&AtomicBool>,
    ) -> FlintResult<Array2<RetrievalResult>> {
        let results = self.run(scene, cancel, |pipeline, obs| pipeline.retrieve(obs))?;

        let retrieved = results.iter().filter(|r| r.is_retrieved()).count();
        log::info!("Retrieved {} of {} pixels", retrieved, results.len());
        Ok(results)
    }

    /// Like [`Self::process`], keeping every intermediate quantity
    pub fn process_detailed(
        &self,
        scene: &Array2<PixelObservation>,
        cancel: Option<&AtomicBool>,
    ) -> FlintResult<Array2<PixelDiagnostics>> {
        self.run(scene, cancel, |pipeline, obs| pipeline.retrieve_detailed(obs))
    }

    fn run<T, F>(
        &self,
        scene: &Array2<PixelObservation>,
        cancel: Option<&AtomicBool>,
        retrieve: F,
    ) -> FlintResult<Array2<T>>
    where
        T: Clone + Default + Send,
        F: Fn(&mut PixelPipeline, &PixelObservation) -> FlintResult<T> + Sync,
    {
        let (height, width) = scene.dim();
        log::info!("Processing scene of {}x{} pixels", height, width);
        let start_time = std::time::Instant::now();

        let prepared = self.prepare_scene(scene);

        let process_row = |pipeline: &mut PixelPipeline, row: ArrayView1<PixelObservation>| {
            if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                return Err(FlintError::Cancelled);
            }
            row.iter()
                .map(|obs| retrieve(pipeline, obs))
                .collect::<FlintResult<Vec<T>>>()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<T>> = {
            use rayon::prelude::*;
            prepared
                .axis_iter(Axis(0))
                .into_par_iter()
                .map_init(|| self.pipeline.duplicate(), |pipeline, row| process_row(pipeline, row))
                .collect::<FlintResult<Vec<Vec<T>>>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<T>> = {
            let mut pipeline = self.pipeline.duplicate();
            prepared
                .axis_iter(Axis(0))
                .map(|row| process_row(&mut pipeline, row))
                .collect::<FlintResult<Vec<Vec<T>>>>()?
        };

        let mut output = Array2::from_elem((height, width), T::default());
        for (mut out_row, values) in output.axis_iter_mut(Axis(0)).zip(rows) {
            for (dst, value) in out_row.iter_mut().zip(values) {
                *dst = value;
            }
        }

        log::debug!("Scene processed in {:?}", start_time.elapsed());
        Ok(output)
    }
}
