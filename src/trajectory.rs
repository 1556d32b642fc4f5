//! Trajectory tracking: the history of scored inputs and its second-order
//! signals.
//!
//! Each recorded [`CoherenceSample`] contributes one numeric row
//! `features ++ [coherence]`. Two signals are derived from the rows:
//!
//! - **drift** — `‖x_n − x_{n−1}‖`, the size of the last step
//! - **curvature** — the angle between the last two steps, in `[0, π]`
//!
//! Both are 0 until enough rows exist (2 and 3 respectively). Retention is
//! explicit: [`RetentionPolicy::Unbounded`] keeps everything,
//! [`RetentionPolicy::Window`] keeps a ring buffer of the most recent rows.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::geometry::{self, clamp_unit};

/// Smallest window that still defines curvature.
pub const MIN_WINDOW: usize = 3;

/// How much history the trajectory keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every sample.
    #[default]
    Unbounded,
    /// Keep the most recent `n` samples, `n >= 3`.
    Window(usize),
}

impl RetentionPolicy {
    fn capacity(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Window(n) => Some((*n).max(MIN_WINDOW)),
        }
    }
}

/// One scored input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceSample {
    pub features: FeatureVector,
    /// Coherence in `[0, 1]`.
    pub coherence: f64,
    /// Milliseconds since the UNIX epoch, from the engine clock.
    pub timestamp: u64,
    /// Whitespace token count of the input.
    pub token_count: usize,
}

impl CoherenceSample {
    pub fn new(features: FeatureVector, coherence: f64, timestamp: u64, token_count: usize) -> Self {
        Self {
            features,
            coherence: clamp_unit(coherence),
            timestamp,
            token_count,
        }
    }

    /// Numeric row used for drift and curvature.
    pub fn row(&self) -> Vec<f64> {
        let mut row = self.features.as_slice().to_vec();
        row.push(self.coherence);
        row
    }
}

/// Coherence and the derived signals at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub coherence: f64,
    pub drift: f64,
    pub curvature: f64,
}

/// Ordered history of samples with a parallel numeric view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trajectory {
    policy: RetentionPolicy,
    samples: VecDeque<CoherenceSample>,
    rows: VecDeque<Vec<f64>>,
    surface: VecDeque<SurfacePoint>,
    /// Samples ever recorded, including evicted ones.
    recorded: u64,
}

impl Trajectory {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Append a sample and return the signals at the new head.
    pub fn push(&mut self, sample: CoherenceSample) -> SurfacePoint {
        self.rows.push_back(sample.row());
        let coherence = sample.coherence;
        self.samples.push_back(sample);
        self.recorded += 1;

        let point = SurfacePoint {
            coherence,
            drift: self.drift(),
            curvature: self.curvature(),
        };
        self.surface.push_back(point);

        self.evict();
        point
    }

    /// Switch retention policy, evicting immediately if the new window is
    /// smaller than the history.
    pub fn set_policy(&mut self, policy: RetentionPolicy) {
        self.policy = policy;
        self.evict();
    }

    fn evict(&mut self) {
        if let Some(cap) = self.policy.capacity() {
            while self.samples.len() > cap {
                self.samples.pop_front();
                self.rows.pop_front();
                self.surface.pop_front();
            }
        }
    }

    /// `‖x_n − x_{n−1}‖`, or 0 with fewer than two rows.
    pub fn drift(&self) -> f64 {
        let n = self.rows.len();
        if n < 2 {
            return 0.0;
        }
        let (prev, last) = (&self.rows[n - 2], &self.rows[n - 1]);
        if prev.len() != last.len() {
            return 0.0;
        }
        geometry::distance(last, prev)
    }

    /// Angle between the last two steps in `[0, π]`, or 0 with fewer than
    /// three rows.
    pub fn curvature(&self) -> f64 {
        let n = self.rows.len();
        if n < 3 {
            return 0.0;
        }
        let (a, b, c) = (&self.rows[n - 3], &self.rows[n - 2], &self.rows[n - 1]);
        if a.len() != b.len() || b.len() != c.len() {
            return 0.0;
        }
        let d1 = geometry::sub(b, a);
        let d2 = geometry::sub(c, b);
        geometry::angle(&d1, &d2)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total samples recorded, including any evicted by the window.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn last(&self) -> Option<&CoherenceSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &CoherenceSample> {
        self.samples.iter()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn surface(&self) -> impl Iterator<Item = &SurfacePoint> {
        self.surface.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sample(components: &[f64], coherence: f64) -> CoherenceSample {
        CoherenceSample::new(FeatureVector::new(components.to_vec()), coherence, 0, 1)
    }

    #[test]
    fn empty_trajectory_has_no_signals() {
        let t = Trajectory::default();
        assert_eq!(t.drift(), 0.0);
        assert_eq!(t.curvature(), 0.0);
        assert!(t.is_empty());
    }

    #[test]
    fn drift_needs_two_samples() {
        let mut t = Trajectory::default();
        let first = t.push(sample(&[0.5, 0.5], 1.0));
        assert_eq!(first.drift, 0.0);
        let second = t.push(sample(&[0.5, 0.8], 0.9));
        // Rows (0.5, 0.5, 1.0) → (0.5, 0.8, 0.9)
        let expected = (0.3f64 * 0.3 + 0.1 * 0.1).sqrt();
        assert!((second.drift - expected).abs() < 1e-12);
        assert_eq!(second.curvature, 0.0);
    }

    #[test]
    fn straight_line_has_near_zero_curvature() {
        let mut t = Trajectory::default();
        t.push(sample(&[0.1, 0.1], 0.1));
        t.push(sample(&[0.5, 0.5], 0.5));
        let point = t.push(sample(&[0.9, 0.9], 0.9));
        // Not exactly 0: the epsilon in the denominator bends short steps.
        assert!(point.curvature < 0.2, "{}", point.curvature);
    }

    #[test]
    fn reversal_has_large_curvature() {
        let mut t = Trajectory::default();
        t.push(sample(&[0.1, 0.1], 0.1));
        t.push(sample(&[0.9, 0.9], 0.9));
        let point = t.push(sample(&[0.1, 0.1], 0.1));
        assert!(point.curvature > 3.0 && point.curvature <= PI);
    }

    #[test]
    fn repeated_input_gives_right_angle() {
        // A zero step collapses the cosine to 0.
        let mut t = Trajectory::default();
        t.push(sample(&[0.1, 0.4], 0.5));
        t.push(sample(&[0.9, 0.4], 0.7));
        let point = t.push(sample(&[0.9, 0.4], 0.7));
        assert_eq!(point.drift, 0.0);
        assert!((point.curvature - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn window_policy_evicts_oldest() {
        let mut t = Trajectory::new(RetentionPolicy::Window(3));
        for i in 0..10 {
            t.push(sample(&[i as f64 / 10.0, 0.5], 0.5));
        }
        assert_eq!(t.len(), 3);
        assert_eq!(t.recorded(), 10);
        assert_eq!(t.rows().count(), 3);
        assert_eq!(t.surface().count(), 3);
        assert!((t.last().unwrap().features.as_slice()[0] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn narrowing_policy_evicts_at_once() {
        let mut t = Trajectory::default();
        for i in 0..8 {
            t.push(sample(&[i as f64 / 10.0, 0.5], 0.5));
        }
        t.set_policy(RetentionPolicy::Window(4));
        assert_eq!(t.len(), 4);
        assert_eq!(t.rows().count(), 4);
        assert_eq!(t.surface().count(), 4);
        assert_eq!(t.recorded(), 8);
        assert!((t.last().unwrap().features.as_slice()[0] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn window_never_smaller_than_three() {
        let mut t = Trajectory::new(RetentionPolicy::Window(1));
        for _ in 0..5 {
            t.push(sample(&[0.2, 0.3], 0.4));
        }
        assert_eq!(t.len(), MIN_WINDOW);
    }

    #[test]
    fn mismatched_dimensions_do_not_panic() {
        let mut t = Trajectory::default();
        t.push(sample(&[0.2, 0.3], 0.4));
        t.push(sample(&[0.2, 0.3, 0.1, 0.1], 0.4));
        assert_eq!(t.drift(), 0.0);
        t.push(sample(&[0.2, 0.3, 0.1, 0.1], 0.4));
        assert_eq!(t.curvature(), 0.0);
    }

    #[test]
    fn signals_stay_in_range_on_random_walk() {
        let mut t = Trajectory::default();
        let mut x = 0.37_f64;
        for _ in 0..200 {
            // Deterministic chaotic sequence in (0, 1).
            x = 3.9 * x * (1.0 - x);
            let point = t.push(sample(&[x, 1.0 - x, x * x], x));
            assert!(point.drift >= 0.0);
            assert!((0.0..=PI).contains(&point.curvature));
        }
    }
}
