use crate::core::math::ols_line;
use crate::types::FlintParams;
use ndarray::{Array2, ArrayViewMut1, Axis};

/// Repairs the artificial view azimuth discontinuity around the sub-satellite
/// point by linear fits on both sides of it.
#[derive(Debug, Clone, Copy)]
pub struct AzimuthCorrector {
    ratio_min: f64,
    ratio_max: f64,
}

impl Default for AzimuthCorrector {
    fn default() -> Self {
        Self::new(&FlintParams::default())
    }
}

impl AzimuthCorrector {
    pub fn new(params: &FlintParams) -> Self {
        Self {
            ratio_min: params.discontinuity_ratio_min,
            ratio_max: params.discontinuity_ratio_max,
        }
    }

    fn is_discontinuity(&self, y: &[f64], i: usize) -> bool {
        let ratio = (y[i + 2] - y[i]) / (y[i] - y[i - 2]);
        ratio < self.ratio_min || ratio > self.ratio_max
    }

    /// First index from the left where the second-order difference ratio leaves the window
    pub fn left_boundary(&self, y: &[f64]) -> Option<usize> {
        (2..y.len().saturating_sub(2)).find(|&i| self.is_discontinuity(y, i))
    }

    /// First index from the right where the second-order difference ratio leaves the window
    pub fn right_boundary(&self, y: &[f64]) -> Option<usize> {
        (2..y.len().saturating_sub(2))
            .rev()
            .find(|&i| self.is_discontinuity(y, i))
    }

    /// Corrected copy of a view azimuth profile.
    ///
    /// Samples up to the left boundary and from the right boundary on are kept.
    /// In between, the left fit is used up to the midpoint of the two boundaries
    /// and the right fit after it. The profile is returned unchanged when no
    /// boundary is found on either side or a fit is not possible.
    pub fn correction_profile(&self, y: &[f64]) -> Vec<f64> {
        let n = y.len();
        let (left, right) = match (self.left_boundary(y), self.right_boundary(y)) {
            (Some(l), Some(r)) => (l, r),
            _ => return y.to_vec(),
        };
        let mid = (left + right) / 2;

        let left_points: Vec<(f64, f64)> = (0..=left.min(n - 1)).map(|x| (x as f64, y[x])).collect();
        let right_points: Vec<(f64, f64)> = (right..n).map(|x| (x as f64, y[x])).collect();
        let (left_fit, right_fit) = match (ols_line(&left_points), ols_line(&right_points)) {
            (Some(l), Some(r)) => (l, r),
            _ => return y.to_vec(),
        };
        log::trace!("Azimuth discontinuity between {} and {} (split at {})", left, right, mid);

        let mut result = y.to_vec();
        for x in left..=mid {
            result[x] = left_fit.0 + left_fit.1 * x as f64;
        }
        for x in (mid + 1)..right {
            result[x] = right_fit.0 + right_fit.1 * x as f64;
        }
        // a single boundary (left == right) is also the midpoint
        result[right..].copy_from_slice(&y[right..]);
        result
    }

    /// Corrected copy of one raster row
    pub fn correct_azimuth_row(&self, row: &[f64]) -> Vec<f64> {
        let mut corrected = row.to_vec();
        self.correct_row_in_place(&mut corrected);
        corrected
    }

    /// Correct the first run of valid (non-zero) samples of a row.
    ///
    /// The last sample of the run is left as it is.
    pub fn correct_row_in_place(&self, row: &mut [f64]) {
        let width = row.len();
        if width < 2 {
            return;
        }
        let start = (1..width)
            .find(|&x| row[x] != 0.0 && row[x - 1] == 0.0)
            .unwrap_or(0);
        let end = (0..width - 1)
            .find(|&x| row[x] != 0.0 && row[x + 1] == 0.0)
            .unwrap_or(width - 1);
        if start >= end {
            return;
        }

        let segment = &row[start..=end];
        if segment.iter().all(|&v| v == 0.0) {
            return;
        }
        let profile = self.correction_profile(segment);
        row[start..end].copy_from_slice(&profile[..end - start]);
    }

    fn correct_view(&self, mut row: ArrayViewMut1<f64>) {
        match row.as_slice_mut() {
            Some(slice) => self.correct_row_in_place(slice),
            None => {
                let corrected = self.correct_azimuth_row(&row.to_vec());
                row.iter_mut().zip(corrected).for_each(|(dst, v)| *dst = v);
            }
        }
    }

    /// Correct every row of a view azimuth raster in place
    pub fn correct_view_azimuth_raster(&self, raster: &mut Array2<f64>) {
        log::debug!("Correcting view azimuth discontinuity on {:?} raster", raster.dim());

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            raster
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .for_each(|row| self.correct_view(row));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for row in raster.axis_iter_mut(Axis(0)) {
                self.correct_view(row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Rising 10..16, falling 15..9, rising 8..13
    fn dip_profile() -> Vec<f64> {
        let mut y: Vec<f64> = (0..=6).map(|i| 10.0 + i as f64).collect();
        y.extend((7..=13).map(|i| 22.0 - i as f64));
        y.extend((14..20).map(|i| i as f64 - 6.0));
        y
    }

    #[test]
    fn test_boundaries() {
        let corrector = AzimuthCorrector::default();
        let y = dip_profile();
        assert_eq!(corrector.left_boundary(&y), Some(5));
        assert_eq!(corrector.right_boundary(&y), Some(15));
    }

    #[test]
    fn test_correction_profile() {
        let corrector = AzimuthCorrector::default();
        let y = dip_profile();
        assert_eq!(y.len(), 20);

        let result = corrector.correction_profile(&y);
        assert_eq!(result.len(), 20);
        let expected = [
            (2, 12.0),
            (6, 16.0),
            (7, 17.0),
            (8, 18.0),
            (9, 19.0),
            (10, 20.0),
            (11, 5.0),
            (12, 6.0),
            (13, 7.0),
            (14, 8.0),
            (15, 9.0),
            (19, 13.0),
        ];
        for (i, value) in expected {
            assert_abs_diff_eq!(result[i], value, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_single_boundary_keeps_right_samples() {
        let corrector = AzimuthCorrector::default();
        // curved up to x = 10, then a steep straight line
        let y: Vec<f64> = (0..20)
            .map(|x| {
                let x = x as f64;
                if x <= 10.0 {
                    100.0 + x + 0.02 * x * x
                } else {
                    112.0 + 15.0 * (x - 10.0)
                }
            })
            .collect();
        assert_eq!(corrector.left_boundary(&y), Some(10));
        assert_eq!(corrector.right_boundary(&y), Some(10));

        let result = corrector.correction_profile(&y);
        assert_eq!(result[10], y[10]);
        assert_eq!(&result[10..], &y[10..]);
        assert_eq!(&result[..10], &y[..10]);
    }

    #[test]
    fn test_smooth_profile_unchanged() {
        let corrector = AzimuthCorrector::default();
        let y: Vec<f64> = (0..30).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert_eq!(corrector.correction_profile(&y), y);

        let short = [1.0, 2.0, 3.0];
        assert_eq!(corrector.correction_profile(&short), short.to_vec());
    }

    #[test]
    fn test_row_with_invalid_border() {
        let corrector = AzimuthCorrector::default();
        let mut row = vec![0.0, 0.0];
        row.extend(dip_profile());
        row.extend([0.0, 0.0, 0.0]);

        let corrected = corrector.correct_azimuth_row(&row);
        assert_eq!(corrected.len(), row.len());
        assert_eq!(&corrected[..2], &[0.0, 0.0]);
        assert_abs_diff_eq!(corrected[2 + 8], 18.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corrected[2 + 12], 6.0, epsilon = 1e-6);
        // the last valid sample and the invalid border are kept
        assert_eq!(corrected[21], 13.0);
        assert_eq!(&corrected[22..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_degenerate_rows() {
        let corrector = AzimuthCorrector::default();
        let zeros = vec![0.0; 10];
        assert_eq!(corrector.correct_azimuth_row(&zeros), zeros);

        let single = vec![0.0, 0.0, 5.0, 0.0];
        assert_eq!(corrector.correct_azimuth_row(&single), single);

        assert_eq!(corrector.correct_azimuth_row(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_raster_rows_corrected_independently() {
        let corrector = AzimuthCorrector::default();
        let profile = dip_profile();
        let smooth: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();

        let mut raster = Array2::zeros((3, 20));
        raster.row_mut(0).assign(&ndarray::Array1::from(profile.clone()));
        raster.row_mut(1).assign(&ndarray::Array1::from(smooth.clone()));
        raster.row_mut(2).assign(&ndarray::Array1::from(profile.clone()));

        corrector.correct_view_azimuth_raster(&mut raster);

        let expected = corrector.correct_azimuth_row(&profile);
        for x in 0..20 {
            assert_abs_diff_eq!(raster[[0, x]], expected[x], epsilon = 1e-12);
            assert_abs_diff_eq!(raster[[2, x]], expected[x], epsilon = 1e-12);
            assert_eq!(raster[[1, x]], smooth[x]);
        }
    }
}
