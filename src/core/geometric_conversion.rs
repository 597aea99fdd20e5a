//! Conversion of the AATSR 3.7 µm glint radiance to MERIS observation geometry
//!
//! A windspeed LUT of simulated AATSR radiances is built from the windspeed
//! surrogate, the measured solar part is matched against it, and the matching
//! windspeed is used to simulate the glint in MERIS geometry. A LUT with an
//! interior maximum has two monotone branches and may yield two candidates.

use crate::core::math::{max_index, min_index};
use crate::core::neural_net::NeuralSurrogate;
use crate::types::{FlintError, FlintParams, FlintResult, LutCandidates, WindRadiance};

/// Parameters of the 2-D Gaussian glint model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianParams {
    pub amplitude: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub y0: f64,
}

impl GaussianParams {
    fn from_slice(values: &[f64]) -> Self {
        Self {
            amplitude: values[0],
            sigma_x: values[1],
            sigma_y: values[2],
            y0: values[3],
        }
    }
}

/// Normalized glint radiance for a view zenith and azimuth difference (degrees)
pub fn gauss2d(params: &GaussianParams, view_zenith: f64, azimuth_difference: f64) -> f64 {
    let horizontal = (90.0 - view_zenith).to_radians().cos();
    let azd = azimuth_difference.to_radians();
    let x = horizontal * azd.sin();
    let y = horizontal * azd.cos() - params.y0;
    let u = x * x / (params.sigma_x * params.sigma_x) + y * y / (params.sigma_y * params.sigma_y);
    params.amplitude * (-u / 2.0).exp()
}

/// Simulated AATSR radiance per windspeed
#[derive(Debug, Clone)]
pub struct RadianceLut {
    pub windspeed: Vec<f64>,
    pub radiance: Vec<f64>,
}

impl RadianceLut {
    /// Largest absolute step between consecutive radiances
    pub fn max_step(&self) -> f64 {
        self.radiance
            .windows(2)
            .map(|w| (w[0] - w[1]).abs())
            .fold(0.0, f64::max)
    }

    /// Index ranges of the monotone branches: two when the maximum is interior
    pub fn branches(&self) -> Vec<(usize, usize)> {
        let last = self.radiance.len().saturating_sub(1);
        match max_index(&self.radiance) {
            Some(peak) if peak > 0 && peak < last => vec![(0, peak - 1), (peak, last)],
            _ => vec![(0, last)],
        }
    }
}

pub struct GeometricConverter {
    surrogate: Box<dyn NeuralSurrogate>,
    windspeeds: Vec<f64>,
    refractive_index_37: f64,
    refractive_index_088: f64,
    outputs: Vec<f64>,
}

impl GeometricConverter {
    pub fn new(surrogate: Box<dyn NeuralSurrogate>, params: &FlintParams) -> FlintResult<Self> {
        params.validate()?;
        if surrogate.input_len() != 3 || surrogate.output_len() < 4 {
            return Err(FlintError::Surrogate(format!(
                "windspeed network must map 3 inputs to 4 Gaussian parameters, has {} -> {}",
                surrogate.input_len(),
                surrogate.output_len()
            )));
        }

        let n = params.lut_size;
        let step = (params.lut_windspeed_max - params.lut_windspeed_min) / (n - 1) as f64;
        let windspeeds = (0..n)
            .map(|i| params.lut_windspeed_min + i as f64 * step)
            .collect();
        let outputs = vec![0.0; surrogate.output_len()];

        Ok(Self {
            surrogate,
            windspeeds,
            refractive_index_37: params.refractive_index_37,
            refractive_index_088: params.refractive_index_088,
            outputs,
        })
    }

    pub fn duplicate(&self) -> Self {
        Self {
            surrogate: self.surrogate.duplicate(),
            windspeeds: self.windspeeds.clone(),
            refractive_index_37: self.refractive_index_37,
            refractive_index_088: self.refractive_index_088,
            outputs: vec![0.0; self.outputs.len()],
        }
    }

    pub fn windspeeds(&self) -> &[f64] {
        &self.windspeeds
    }

    /// Gaussian glint parameters for a windspeed, refractive index and sun zenith (degrees)
    pub fn gaussian_params(
        &mut self,
        windspeed: f64,
        refractive_index: f64,
        sun_zenith: f64,
    ) -> FlintResult<GaussianParams> {
        let input = [windspeed, refractive_index, sun_zenith.to_radians().cos()];
        self.surrogate.evaluate(&input, &mut self.outputs)?;
        Ok(GaussianParams::from_slice(&self.outputs))
    }

    /// Simulated 3.7 µm radiances over the windspeed grid
    pub fn build_lut(
        &mut self,
        sun_zenith: f64,
        view_zenith: f64,
        azimuth_difference: f64,
    ) -> FlintResult<RadianceLut> {
        let mut radiance = Vec::with_capacity(self.windspeeds.len());
        for i in 0..self.windspeeds.len() {
            let params = self.gaussian_params(self.windspeeds[i], self.refractive_index_37, sun_zenith)?;
            radiance.push(gauss2d(&params, view_zenith, azimuth_difference));
        }
        Ok(RadianceLut {
            windspeed: self.windspeeds.clone(),
            radiance,
        })
    }

    /// Candidate (windspeed, MERIS radiance) pairs for a measured AATSR solar part.
    ///
    /// The LUT is built at the AATSR azimuth difference, the output radiance is
    /// simulated at the MERIS azimuth difference. Both differences are expected
    /// in the 180° - d convention. In the monotone case only the first slot is used.
    pub fn convert(
        &mut self,
        aatsr_solar_part: f64,
        meris_sun_zenith: f64,
        meris_view_zenith: f64,
        aatsr_azimuth_difference: f64,
        meris_azimuth_difference: f64,
    ) -> FlintResult<LutCandidates> {
        let lut = self.build_lut(meris_sun_zenith, meris_view_zenith, aatsr_azimuth_difference)?;
        let tolerance = lut.max_step();
        let branches = lut.branches();
        log::trace!(
            "LUT branches {:?}, tolerance {:.6}, measured {:.6}",
            branches,
            tolerance,
            aatsr_solar_part
        );

        let mut candidates = LutCandidates::default();
        for (slot, &(start, end)) in branches.iter().enumerate() {
            candidates.0[slot] = self.match_branch(
                &lut,
                start,
                end,
                aatsr_solar_part,
                tolerance,
                meris_sun_zenith,
                meris_view_zenith,
                meris_azimuth_difference,
            )?;
        }
        Ok(candidates)
    }

    #[allow(clippy::too_many_arguments)]
    fn match_branch(
        &mut self,
        lut: &RadianceLut,
        start: usize,
        end: usize,
        measured: f64,
        tolerance: f64,
        sun_zenith: f64,
        view_zenith: f64,
        azimuth_difference: f64,
    ) -> FlintResult<WindRadiance> {
        let diffs: Vec<f64> = lut.radiance[start..=end]
            .iter()
            .map(|r| (r - measured).abs())
            .collect();

        let best = match min_index(&diffs) {
            Some(i) => i,
            None => return Ok(WindRadiance::NONE),
        };
        if diffs[best] > tolerance {
            return Ok(WindRadiance::NONE);
        }

        let windspeed = lut.windspeed[start + best];
        let params = self.gaussian_params(windspeed, self.refractive_index_088, sun_zenith)?;
        Ok(WindRadiance::new(
            windspeed,
            gauss2d(&params, view_zenith, azimuth_difference),
        ))
    }
}
