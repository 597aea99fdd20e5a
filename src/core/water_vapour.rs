use crate::core::neural_net::NeuralSurrogate;
use crate::types::{FlintError, FlintParams, FlintResult, RangeCheck};

/// Number of features fed to the water vapour surrogate
pub const WATER_VAPOUR_FEATURES: usize = 5;

/// Smallest radiance used in the band 15 / band 14 ratio
const MIN_RADIANCE: f64 = 1.0e-4;

/// Water vapour column from ECMWF wind, MERIS geometry and MERIS bands 14/15
pub struct WaterVapourEstimator {
    surrogate: Box<dyn NeuralSurrogate>,
    limits: [(f64, f64); WATER_VAPOUR_FEATURES],
    range_check: RangeCheck,
    standard_value: f64,
}

impl WaterVapourEstimator {
    pub fn new(surrogate: Box<dyn NeuralSurrogate>, params: &FlintParams) -> FlintResult<Self> {
        if surrogate.input_len() != WATER_VAPOUR_FEATURES || surrogate.output_len() < 1 {
            return Err(FlintError::Surrogate(format!(
                "water vapour network must map {} inputs to at least 1 output, has {} -> {}",
                WATER_VAPOUR_FEATURES,
                surrogate.input_len(),
                surrogate.output_len()
            )));
        }
        Ok(Self {
            surrogate,
            limits: params.water_vapour_limits,
            range_check: params.water_vapour_range_check,
            standard_value: params.standard_water_vapour,
        })
    }

    /// Copy with its own surrogate evaluation context
    pub fn duplicate(&self) -> Self {
        Self {
            surrogate: self.surrogate.duplicate(),
            limits: self.limits,
            range_check: self.range_check,
            standard_value: self.standard_value,
        }
    }

    /// Feature vector: windspeed, cos(azd)·sin(vza), cos(vza), cos(sza),
    /// ln(L15 / L14) with both radiances floored at 1e-4. Angles in degrees.
    pub fn features(
        zonal_wind: f64,
        meridional_wind: f64,
        azimuth_difference: f64,
        view_zenith: f64,
        sun_zenith: f64,
        radiance_14: f64,
        radiance_15: f64,
    ) -> [f64; WATER_VAPOUR_FEATURES] {
        let windspeed = zonal_wind.hypot(meridional_wind);
        let azd = azimuth_difference.to_radians();
        let vza = view_zenith.to_radians();
        let sza = sun_zenith.to_radians();

        let r14 = radiance_14.max(MIN_RADIANCE);
        let r15 = radiance_15.max(MIN_RADIANCE);

        [
            windspeed,
            azd.cos() * vza.sin(),
            vza.cos(),
            sza.cos(),
            (r15 / r14).ln(),
        ]
    }

    /// Whether the surrogate may be applied to this feature vector
    pub fn surrogate_applicable(&self, features: &[f64; WATER_VAPOUR_FEATURES]) -> bool {
        match self.range_check {
            // a feature enables the surrogate once it reaches both limits
            RangeCheck::Legacy => features
                .iter()
                .zip(self.limits.iter())
                .any(|(&f, &(lo, hi))| f >= lo && f >= hi),
            RangeCheck::Bounded => features
                .iter()
                .zip(self.limits.iter())
                .all(|(&f, &(lo, hi))| f >= lo && f <= hi),
        }
    }

    /// Water vapour column (g/cm²); the standard value when the surrogate is not applicable
    #[allow(clippy::too_many_arguments)]
    pub fn compute_water_vapour(
        &mut self,
        zonal_wind: f64,
        meridional_wind: f64,
        azimuth_difference: f64,
        view_zenith: f64,
        sun_zenith: f64,
        radiance_14: f64,
        radiance_15: f64,
    ) -> FlintResult<f64> {
        let features = Self::features(
            zonal_wind,
            meridional_wind,
            azimuth_difference,
            view_zenith,
            sun_zenith,
            radiance_14,
            radiance_15,
        );

        if !self.surrogate_applicable(&features) {
            log::trace!("Water vapour features {:?} rejected, using standard value", features);
            return Ok(self.standard_value);
        }

        let mut output = vec![0.0; self.surrogate.output_len()];
        self.surrogate.evaluate(&features, &mut output)?;
        Ok(output[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::neural_net::test_surrogates::constant_water_vapour;
    use approx::assert_abs_diff_eq;

    fn estimator(range_check: RangeCheck) -> WaterVapourEstimator {
        let params = FlintParams {
            water_vapour_range_check: range_check,
            ..FlintParams::default()
        };
        WaterVapourEstimator::new(constant_water_vapour(), &params).unwrap()
    }

    #[test]
    fn test_features() {
        let f = WaterVapourEstimator::features(3.0, 4.0, 60.0, 30.0, 0.0, 0.0, 0.0);
        assert_abs_diff_eq!(f[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f[1], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(f[2], 3f64.sqrt() / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f[3], 1.0, epsilon = 1e-12);
        // both radiances floored: ln(1)
        assert_abs_diff_eq!(f[4], 0.0, epsilon = 1e-12);

        let f = WaterVapourEstimator::features(0.0, 0.0, 0.0, 0.0, 0.0, 0.05, 0.1);
        assert_abs_diff_eq!(f[4], 2f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_legacy_check_keeps_standard_value_for_in_range_features() {
        // every feature lies inside its trained range, yet the legacy rule
        // needs a feature at or above both limits
        let mut wv = estimator(RangeCheck::Legacy);
        let value = wv
            .compute_water_vapour(3.0, 4.0, 60.0, 30.0, 40.0, 0.05, 0.06)
            .unwrap();
        assert_eq!(value, 2.8);
    }

    #[test]
    fn test_legacy_check_applies_surrogate_above_upper_limit() {
        // windspeed 20 >= 18.4
        let mut wv = estimator(RangeCheck::Legacy);
        let value = wv
            .compute_water_vapour(12.0, 16.0, 60.0, 30.0, 40.0, 0.05, 0.06)
            .unwrap();
        assert_eq!(value, 1.7);
    }

    #[test]
    fn test_bounded_check() {
        let mut wv = estimator(RangeCheck::Bounded);
        let value = wv
            .compute_water_vapour(3.0, 4.0, 60.0, 30.0, 40.0, 0.05, 0.06)
            .unwrap();
        assert_eq!(value, 1.7);

        let value = wv
            .compute_water_vapour(12.0, 16.0, 60.0, 30.0, 40.0, 0.05, 0.06)
            .unwrap();
        assert_eq!(value, 2.8);
    }

    #[test]
    fn test_rejects_wrong_surrogate() {
        let glint = crate::core::neural_net::test_surrogates::gaussian_glint();
        assert!(WaterVapourEstimator::new(glint, &FlintParams::default()).is_err());
    }
}
