//! Coherence evaluation: distance of a feature vector from the balanced ideal.
//!
//! The ideal point of a k-dimensional feature space is the uniform unit vector
//! `u = (1/√k, …, 1/√k)`. A feature vector is normalized onto the unit sphere
//! and its coherence is `1 − ‖v̂ − u‖`, clamped into `[0, 1]`:
//!
//! - exactly balanced scores (all components equal and non-zero) → 1
//! - a single dominant axis → `1 − √(2 − 2/√k)`, clamped
//! - the zero vector → 0 by definition
//!
//! [`balance_coherence`] is the older two-signal scalar form kept as a fast
//! path; the engine always uses [`coherence`].

use crate::features::FeatureVector;
use crate::geometry::{self, clamp_unit};

/// Coherence of raw components in `[0, 1]`.
pub fn coherence_of(components: &[f64]) -> f64 {
    let k = components.len();
    let n = geometry::norm(components);
    if k == 0 || n == 0.0 || !n.is_finite() {
        return 0.0;
    }
    let ideal = 1.0 / (k as f64).sqrt();
    let distance = components
        .iter()
        .map(|c| {
            let d = c / n - ideal;
            d * d
        })
        .sum::<f64>()
        .sqrt();
    clamp_unit(1.0 - distance)
}

/// Coherence of a feature vector in `[0, 1]`.
pub fn coherence(vector: &FeatureVector) -> f64 {
    coherence_of(vector.as_slice())
}

/// Scalar fast path: `1 − |harmony − mean(entropy, reflection)|`, clamped.
pub fn balance_coherence(entropy: f64, reflection: f64, harmony: f64) -> f64 {
    let expected = (entropy + reflection) / 2.0;
    clamp_unit(1.0 - (harmony - expected).abs())
}
