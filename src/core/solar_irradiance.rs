use crate::core::aux_tables::AuxTables;
use crate::core::math::{linear_interpolate, nearest_index_descending, simpson_integral};
use crate::types::{FlintError, FlintResult};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

/// Eccentricity term of the Earth-Sun distance approximation
const ORBIT_ECCENTRICITY: f64 = 0.01673;

/// Channel-integrated solar irradiance at 3.7 µm
#[derive(Debug, Clone)]
pub struct SolarIrradianceCalculator {
    tables: Arc<AuxTables>,
}

impl SolarIrradianceCalculator {
    pub fn new(tables: Arc<AuxTables>) -> Self {
        Self { tables }
    }

    /// Response-weighted solar irradiance for the given day of year, corrected
    /// for the Earth-Sun distance.
    ///
    /// The response curve is integrated with Simpson's rule over consecutive
    /// (even-indexed) triplets; the solar spectrum value at the first
    /// wavelength of a triplet is used for the whole triplet.
    pub fn compute_solar_irradiance(&self, day_of_year: u32) -> f64 {
        let response = self.tables.spectral_response();
        let wavelength = response.wavelength();
        let resp = response.response();
        let solar = self.tables.solar_reference();
        let solar_x = solar.x();
        let solar_y = solar.y();

        let mut norm_factor = 0.0;
        let mut integral = 0.0;
        let mut misses = 0usize;

        let mut i = 0;
        while i + 2 < wavelength.len() {
            let step = wavelength[i + 2] - wavelength[i];
            norm_factor += simpson_integral(resp[i], resp[i + 1], resp[i + 2], step);

            let solar_value = match nearest_index_descending(wavelength[i] * 1000.0, solar_x) {
                Some(idx) if idx + 1 < solar_x.len() => linear_interpolate(
                    wavelength[i],
                    solar_x[idx] / 1000.0,
                    solar_x[idx + 1] / 1000.0,
                    solar_y[idx],
                    solar_y[idx + 1],
                ),
                _ => {
                    misses += 1;
                    0.0
                }
            };

            integral += simpson_integral(
                resp[i] * solar_value,
                resp[i + 1] * solar_value,
                resp[i + 2] * solar_value,
                step,
            );
            i += 2;
        }

        if misses > 0 {
            log::warn!(
                "{} response wavelengths outside the solar reference table, solar spectrum taken as 0",
                misses
            );
        }
        if norm_factor == 0.0 {
            log::warn!("Spectral response integrates to zero, solar irradiance set to 0");
            return 0.0;
        }

        let mean_radiance = integral / norm_factor;
        let rsun = earth_sun_distance(day_of_year);
        let irradiance = mean_radiance * 10.0 / (rsun * rsun);

        log::info!(
            "Solar irradiance at 3.7um for day {}: {:.4} (Earth-Sun distance {:.5} AU)",
            day_of_year,
            irradiance,
            rsun
        );
        irradiance
    }
}

/// Earth-Sun distance in AU for a day of year
pub fn earth_sun_distance(day_of_year: u32) -> f64 {
    let angle = (0.9856 * (day_of_year as f64 - 2.0)).to_radians();
    1.0 - ORBIT_ECCENTRICITY * angle.cos()
}

pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Day of year from a compact `yyyymmdd...` date string, e.g. a product start time
pub fn day_of_year_from_compact(date: &str) -> FlintResult<u32> {
    let compact = date
        .trim()
        .get(..8)
        .ok_or_else(|| FlintError::InvalidDate(format!("'{}' is shorter than yyyymmdd", date)))?;
    let parsed = NaiveDate::parse_from_str(compact, "%Y%m%d")
        .map_err(|e| FlintError::InvalidDate(format!("'{}': {}", date, e)))?;
    Ok(day_of_year(parsed))
}
