use crate::core::aux_tables::AuxTables;
use crate::types::{Channel, FlintResult};
use std::sync::Arc;

/// k-distribution atmospheric transmission at 3.7 µm and 1.6 µm
#[derive(Debug, Clone)]
pub struct TransmissionModel {
    tables: Arc<AuxTables>,
    water_vapour_reference: f64,
}

impl TransmissionModel {
    pub fn new(tables: Arc<AuxTables>, water_vapour_reference: f64) -> Self {
        Self {
            tables,
            water_vapour_reference,
        }
    }

    /// Two-way air mass for sun and view zenith angles in degrees
    pub fn air_mass(sun_zenith: f64, view_zenith: f64) -> f64 {
        1.0 / sun_zenith.to_radians().cos() + 1.0 / view_zenith.to_radians().cos()
    }

    /// Transmission for a water vapour column (g/cm²) and sun/view zenith angles (degrees).
    ///
    /// Sum over spectral intervals i of w_i · exp(-am · Σ_j (A_ij + H_ij · wv / wv_ref)),
    /// with the water vapour weights. Not clamped to [0, 1].
    pub fn transmission(
        &self,
        channel: Channel,
        water_vapour: f64,
        sun_zenith: f64,
        view_zenith: f64,
    ) -> f64 {
        let set = self.tables.k_distribution_set(channel);
        let dry = &set.dry().coefficients;
        let wet = set.water_vapour();

        let am = Self::air_mass(sun_zenith, view_zenith);
        let scale = water_vapour / self.water_vapour_reference;

        dry.outer_iter()
            .zip(wet.coefficients.outer_iter())
            .zip(wet.weights.iter())
            .map(|((a, h), &weight)| {
                let optical_depth: f64 = a
                    .iter()
                    .zip(h.iter())
                    .map(|(&a, &h)| a + h * scale)
                    .sum();
                weight * (-am * optical_depth).exp()
            })
            .sum()
    }

    /// Transmission with a raw channel code (37 or 16)
    pub fn transmission_for_code(
        &self,
        channel: u32,
        water_vapour: f64,
        sun_zenith: f64,
        view_zenith: f64,
    ) -> FlintResult<f64> {
        let channel = Channel::from_code(channel)?;
        Ok(self.transmission(channel, water_vapour, sun_zenith, view_zenith))
    }

    /// Like [`Self::transmission_for_code`], but an unsupported channel code
    /// yields zero transmission with a warning.
    pub fn transmission_or_zero(
        &self,
        channel: u32,
        water_vapour: f64,
        sun_zenith: f64,
        view_zenith: f64,
    ) -> f64 {
        match self.transmission_for_code(channel, water_vapour, sun_zenith, view_zenith) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{}; transmission set to 0", e);
                0.0
            }
        }
    }
}
