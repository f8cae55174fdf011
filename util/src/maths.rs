//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
///
/// The value is not limited to the source range, values outside it are extrapolated.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Return the euclidian norm (distance between) of two points.
///
/// If the points do not have the same number of dimentions then `None` is
/// returned.
pub fn norm<T>(point_0: &[T], point_1: &[T]) -> Option<T>
where
    T: Float + std::ops::AddAssign,
{
    // Check that the dimentions match
    if point_0.len() != point_1.len() {
        return None;
    }

    let mut sum = T::zero();

    for (a, b) in point_0.iter().zip(point_1.iter()) {
        sum += (*a - *b).powi(2);
    }

    Some(sum.sqrt())
}

/// Limit a value to the range `[min, max]`.
///
/// NaN is passed through unchanged, callers which can produce NaN must guard against it.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0.0, 180.0), (150.0, 850.0), 0.0), 150.0);
        assert_eq!(lin_map((0.0, 180.0), (150.0, 850.0), 180.0), 850.0);
        assert_eq!(lin_map((0.0, 180.0), (150.0, 850.0), 90.0), 500.0);
        assert_eq!(lin_map((0.0, 10.0), (0.0, 100.0), 20.0), 200.0);
    }

    #[test]
    fn test_norm() {
        assert_eq!(norm(&[0.0, 0.0], &[3.0, 4.0]), Some(5.0));
        assert_eq!(norm(&[1.0, 1.0], &[1.0, 1.0]), Some(0.0));
        assert_eq!(norm(&[1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&1.5, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-1.5, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25, &-1.0, &1.0), 0.25);
        assert!(clamp(&f64::NAN, &-1.0, &1.0).is_nan());
    }
}
