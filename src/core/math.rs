//! Small numeric helpers shared by the retrieval components

use num_traits::Float;

/// Index of the element of an ascending array closest to `x`.
///
/// The first element larger than `x` and its left neighbour are compared;
/// equal distances resolve to the larger element. `x` equal to the last
/// element gives the last index; `None` when `x` is beyond it.
pub fn nearest_index_ascending<T: Float>(x: T, array: &[T]) -> Option<usize> {
    for i in 1..array.len() {
        if x < array[i] {
            return if array[i] - x > x - array[i - 1] {
                Some(i - 1)
            } else {
                Some(i)
            };
        }
    }
    last_if_equal(x, array)
}

/// Index of the element of a descending array closest to `x`.
///
/// Mirror of [`nearest_index_ascending`]: `x` equal to the last element gives
/// the last index, `None` when `x` is below it.
pub fn nearest_index_descending<T: Float>(x: T, array: &[T]) -> Option<usize> {
    for i in 1..array.len() {
        if x > array[i] {
            return if array[i] - x < x - array[i - 1] {
                Some(i - 1)
            } else {
                Some(i)
            };
        }
    }
    last_if_equal(x, array)
}

fn last_if_equal<T: Float>(x: T, array: &[T]) -> Option<usize> {
    match array.last() {
        Some(&last) if last == x => Some(array.len() - 1),
        _ => None,
    }
}

/// Linear interpolation of y(x) between (x1, y1) and (x2, y2).
///
/// Returns `y1` for a degenerate interval. `x` is not checked against
/// `[x1, x2]`; outside the interval the line is extrapolated.
pub fn linear_interpolate<T: Float>(x: T, x1: T, x2: T, y1: T, y2: T) -> T {
    if x1 == x2 {
        y1
    } else {
        let slope = (y2 - y1) / (x2 - x1);
        y1 + slope * (x - x1)
    }
}

/// Simpson's rule over [x1, x3] with constant step; `y2` must be y at the midpoint.
pub fn simpson_integral<T: Float>(y1: T, y2: T, y3: T, interval_size: T) -> T {
    let two = T::one() + T::one();
    let four = two + two;
    let h = interval_size / (four + two);
    h * (y1 + four * y2 + y3)
}

/// Index of the maximum; first occurrence wins, NaNs are skipped
pub fn max_index<T: Float>(values: &[T]) -> Option<usize> {
    extremum_index(values, |candidate, best| candidate > best)
}

/// Index of the minimum; first occurrence wins, NaNs are skipped
pub fn min_index<T: Float>(values: &[T]) -> Option<usize> {
    extremum_index(values, |candidate, best| candidate < best)
}

pub fn max_value<T: Float>(values: &[T]) -> Option<T> {
    max_index(values).map(|i| values[i])
}

pub fn min_value<T: Float>(values: &[T]) -> Option<T> {
    min_index(values).map(|i| values[i])
}

fn extremum_index<T: Float>(values: &[T], better: impl Fn(T, T) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some(b) if !better(v, values[b]) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Ordinary least squares fit y = intercept + slope * x.
///
/// Returns `None` for fewer than two points or when all x are equal.
pub fn ols_line(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some((mean_y - slope * mean_x, slope))
}
