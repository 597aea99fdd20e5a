//! Per-pixel preparation: pixel screening and azimuth differences

use crate::types::PixelObservation;

/// Minimum 3.7 µm brightness temperature of a useful pixel (K)
pub const DEFAULT_MIN_BT_37: f64 = 270.0;

/// Relative azimuth between view and sun (degrees).
///
/// Negative azimuths are shifted by 360 first. A difference above 180 is
/// folded to 360 - d, a negative one is mirrored; the fold is applied before
/// the mirror, so view azimuths far below the sun azimuth are not folded.
pub fn azimuth_difference(view_azimuth: f64, sun_azimuth: f64) -> f64 {
    let view = if view_azimuth < 0.0 { view_azimuth + 360.0 } else { view_azimuth };
    let sun = if sun_azimuth < 0.0 { sun_azimuth + 360.0 } else { sun_azimuth };

    let mut difference = view - sun;
    if difference > 180.0 {
        difference = 360.0 - difference;
    }
    if difference < 0.0 {
        difference = -difference;
    }
    difference
}

/// Whether a pixel is worth processing: sea, inside the AATSR nadir swath,
/// and not saturated at 3.7 µm. The cloud and sunglint flags are not used.
pub fn is_useful_pixel(
    land: bool,
    cloudy: bool,
    sunglint: bool,
    view_elevation: f64,
    bt_37: f64,
) -> bool {
    is_useful_pixel_with_threshold(land, cloudy, sunglint, view_elevation, bt_37, DEFAULT_MIN_BT_37)
}

pub fn is_useful_pixel_with_threshold(
    land: bool,
    _cloudy: bool,
    _sunglint: bool,
    view_elevation: f64,
    bt_37: f64,
    min_bt_37: f64,
) -> bool {
    !land && view_elevation > 0.0 && bt_37 > min_bt_37
}

/// Screening of a full observation, including the MERIS invalid flag
pub fn is_useful_observation(observation: &PixelObservation, min_bt_37: f64) -> bool {
    !observation.meris_invalid
        && is_useful_pixel_with_threshold(
            observation.aatsr_land,
            observation.aatsr_cloudy,
            observation.aatsr_sunglint,
            observation.aatsr_view_elevation,
            observation.aatsr_bt_37,
            min_bt_37,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azimuth_difference() {
        assert_eq!(azimuth_difference(100.0, 40.0), 60.0);
        assert_eq!(azimuth_difference(40.0, 100.0), 60.0);
        // wrapped through north
        assert_eq!(azimuth_difference(350.0, 10.0), 20.0);
        assert_eq!(azimuth_difference(-10.0, 10.0), 20.0);
        assert_eq!(azimuth_difference(10.0, -170.0), 180.0);
        assert_eq!(azimuth_difference(90.0, 90.0), 0.0);
        // mirrored, not folded
        assert_eq!(azimuth_difference(10.0, 350.0), 340.0);
    }

    #[test]
    fn test_useful_pixel() {
        assert!(is_useful_pixel(false, false, false, 30.0, 280.0));
        assert!(!is_useful_pixel(true, false, false, 30.0, 280.0));
        assert!(!is_useful_pixel(false, false, false, 0.0, 280.0));
        assert!(!is_useful_pixel(false, false, false, 30.0, 270.0));

        // cloud and glint flags do not enter the decision
        assert!(is_useful_pixel(false, true, false, 30.0, 280.0));
        assert!(is_useful_pixel(false, true, true, 30.0, 280.0));
        assert!(is_useful_pixel(false, false, true, 30.0, 280.0));
    }

    #[test]
    fn test_useful_observation() {
        let mut obs = PixelObservation {
            aatsr_view_elevation: 40.0,
            aatsr_bt_37: 290.0,
            ..PixelObservation::default()
        };
        assert!(is_useful_observation(&obs, DEFAULT_MIN_BT_37));
        assert!(!is_useful_observation(&obs, 295.0));

        obs.meris_invalid = true;
        assert!(!is_useful_observation(&obs, DEFAULT_MIN_BT_37));
    }
}
