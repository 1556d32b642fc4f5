//! Small dense-vector kernels shared by coherence, trajectory and recall.
//!
//! Plain scalar loops over `f64` slices; vectors here have at most five
//! components. Mismatched lengths are a caller bug and only checked in debug
//! builds, matching the rest of the numeric code.

/// Denominator guard for ratios and angle computations.
pub const EPSILON: f64 = 0.005;

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm.
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Component-wise `a - b`.
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Euclidean distance between two points.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity with an epsilon-guarded denominator.
///
/// Zero vectors yield 0 rather than NaN.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    dot(a, b) / (norm(a) * norm(b) + EPSILON)
}

/// Angle between two vectors in `[0, π]`.
///
/// The cosine is clipped to `[-1, 1]` before `acos` so floating-point
/// overshoot can never produce NaN.
pub fn angle(a: &[f64], b: &[f64]) -> f64 {
    let cos = cosine(a, b);
    let cos = if cos.is_nan() { 1.0 } else { cos.clamp(-1.0, 1.0) };
    cos.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn norm_of_unit_axes() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert_eq!(norm(&[]), 0.0);
    }

    #[test]
    fn distance_matches_norm_of_difference() {
        let a = [0.2, 0.9, 0.4];
        let b = [0.7, 0.1, 0.4];
        assert!((distance(&a, &b) - norm(&sub(&a, &b))).abs() < 1e-12);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn angle_is_bounded() {
        let opposite = angle(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!(opposite > 0.0 && opposite <= PI);
        let same = angle(&[1.0, 1.0], &[2.0, 2.0]);
        assert!(same >= 0.0 && same < 0.1);
        // Degenerate input: cosine collapses to 0, never NaN.
        assert!((angle(&[0.0, 0.0], &[0.0, 0.0]) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_unit_handles_nan() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
    }
}
