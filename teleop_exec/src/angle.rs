//! # Joint Angle Calculation
//!
//! Interior angle at a vertex formed by three image points.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::Landmark;
use util::maths::{clamp, norm};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Angle reported when one of the arms of the angle has no length, i.e. the vertex coincides
/// with one of the other points.
///
/// Units: degrees
pub const DEGENERATE_ANGLE_DEG: f64 = 180.0;

/// Below this product of arm lengths the angle is treated as degenerate.
///
/// Units: pixels^2
const MIN_NORM_PRODUCT: f64 = 1e-9;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the angle at `p2` between the rays `p2 -> p1` and `p2 -> p3`.
///
/// The result is in the range `[0, 180]` degrees and is never NaN. If `p2` coincides with
/// either of the other points [`DEGENERATE_ANGLE_DEG`] is returned.
pub fn angle_between(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2]) -> f64 {
    let a = [p1[0] - p2[0], p1[1] - p2[1]];
    let b = [p3[0] - p2[0], p3[1] - p2[1]];

    let norm_a = norm(&a, &[0.0, 0.0]).unwrap_or(0.0);
    let norm_b = norm(&b, &[0.0, 0.0]).unwrap_or(0.0);
    let norm_product = norm_a * norm_b;

    if !(norm_product > MIN_NORM_PRODUCT) {
        return DEGENERATE_ANGLE_DEG;
    }

    // Rounding can push the cosine just outside [-1, 1], which would make acos return NaN
    let cos = clamp(&((a[0] * b[0] + a[1] * b[1]) / norm_product), &-1.0, &1.0);

    cos.acos().to_degrees()
}

/// Calculate the angle at landmark `l2` between `l1` and `l3`, see [`angle_between`].
pub fn landmark_angle(l1: &Landmark, l2: &Landmark, l3: &Landmark) -> f64 {
    angle_between(l1.xy(), l2.xy(), l3.xy())
}
