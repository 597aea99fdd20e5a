use crate::types::{LutCandidates, WindRadiance};

/// Picks one of up to two LUT candidates using the ECMWF wind field
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbiguityResolver;

impl AmbiguityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve with the field windspeed taken from the wind components
    pub fn resolve(
        &self,
        candidates: &LutCandidates,
        zonal_wind: f64,
        meridional_wind: f64,
    ) -> WindRadiance {
        self.resolve_field(candidates, zonal_wind.hypot(meridional_wind))
    }

    /// A single valid candidate is returned as is; of two valid candidates the one
    /// whose windspeed is closer to `field` wins, ties go to the second.
    pub fn resolve_field(&self, candidates: &LutCandidates, field: f64) -> WindRadiance {
        let first = candidates.first();
        let second = candidates.second();

        match (first.is_valid(), second.is_valid()) {
            (true, false) => first,
            (false, true) => second,
            (false, false) => WindRadiance::NONE,
            (true, true) => {
                let d1 = (first.windspeed - field).abs();
                let d2 = (second.windspeed - field).abs();
                log::trace!(
                    "Ambiguous windspeeds {:.2} / {:.2}, field windspeed {:.2}",
                    first.windspeed,
                    second.windspeed,
                    field
                );
                if d1 >= d2 {
                    second
                } else {
                    first
                }
            }
        }
    }
}
