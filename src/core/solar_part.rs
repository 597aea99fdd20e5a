use crate::core::aux_tables::AuxTables;
use crate::core::math::{linear_interpolate, nearest_index_ascending};
use crate::types::FlintParams;
use std::f64::consts::PI;
use std::sync::Arc;

/// Separates the solar (glint) part of the AATSR 3.7 µm signal from its
/// thermal emission
#[derive(Debug, Clone)]
pub struct ThermalSolarSeparator {
    tables: Arc<AuxTables>,
    thermal_coefficients: [f64; 3],
    cloud_specular_divisor: f64,
    cloud_tolerance: f64,
}

impl ThermalSolarSeparator {
    pub fn new(tables: Arc<AuxTables>, params: &FlintParams) -> Self {
        Self {
            tables,
            thermal_coefficients: params.thermal_coefficients,
            cloud_specular_divisor: params.cloud_specular_divisor,
            cloud_tolerance: params.cloud_tolerance,
        }
    }

    /// Thermal 3.7 µm brightness temperature extrapolated from the 11 and 12 µm channels
    pub fn extrapolate_to_37(&self, bt_11: f64, bt_12: f64) -> f64 {
        let [c0, c1, c2] = self.thermal_coefficients;
        c0 + c1 * bt_11 + c2 * (bt_11 - bt_12)
    }

    /// 3.7 µm radiance for a brightness temperature; 0 outside the table
    pub fn bt_to_radiance(&self, bt: f64) -> f64 {
        let table = self.tables.temp_radiance();
        let temperature = table.temperature();
        let radiance = table.radiance();

        match nearest_index_ascending(bt, temperature) {
            Some(i) if i + 1 < temperature.len() => linear_interpolate(
                bt,
                temperature[i],
                temperature[i + 1],
                radiance[i],
                radiance[i + 1],
            ),
            _ => {
                log::trace!("BT {} K outside the temperature/radiance table", bt);
                0.0
            }
        }
    }

    /// Solar part of a normalized radiance (1/sr)
    pub fn compute_solar_part(measured: f64, thermal: f64, transmission: f64) -> f64 {
        (measured - thermal) / transmission
    }

    /// Normalized radiance converted to reflectance units (%)
    pub fn to_instrument_units(solar_part: f64, sun_elevation: f64) -> f64 {
        solar_part * PI * 100.0 / (90.0 - sun_elevation).to_radians().cos()
    }

    /// Specular 1.6 µm reflectance: measured reflectance corrected for transmission
    pub fn specular_reflectance(reflectance_16: f64, transmission_16: f64) -> f64 {
        reflectance_16 / transmission_16
    }

    /// Cloud test comparing the 3.7 µm solar part with the 1.6 µm specular reflectance
    pub fn is_additional_cloud(&self, specular_reflectance: f64, solar_part_units: f64) -> bool {
        let expected = specular_reflectance / self.cloud_specular_divisor;
        (expected - solar_part_units).abs() > self.cloud_tolerance
    }
}
