//! Running coherence baseline and decayed feedback.
//!
//! Each exchange computes a feedback value from the trailing window of past
//! coherence values, weighting the most recent `e^0`, the one before `e^-1`,
//! and so on. The baseline mean then moves toward that feedback by an
//! exponential moving average, and the current coherence joins the window.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geometry::clamp_unit;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Past coherence values kept for feedback (default: 5).
    #[serde(default = "default_window")]
    pub window: usize,
    /// Baseline mean before any exchange (default: 0.75).
    #[serde(default = "default_initial_mean")]
    pub initial_mean: f64,
    /// EMA weight of the new feedback value (default: 0.1).
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Add `(density − mean)² · curvature_scale` to the feedback.
    #[serde(default)]
    pub information_curvature: bool,
    #[serde(default = "default_curvature_scale")]
    pub curvature_scale: f64,
}

fn default_window() -> usize {
    5
}
fn default_initial_mean() -> f64 {
    0.75
}
fn default_smoothing() -> f64 {
    0.1
}
fn default_curvature_scale() -> f64 {
    0.1
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            initial_mean: default_initial_mean(),
            smoothing: default_smoothing(),
            information_curvature: false,
            curvature_scale: default_curvature_scale(),
        }
    }
}

/// `|coherence − mean|`.
pub fn baseline_drift(coherence: f64, mean: f64) -> f64 {
    (coherence - mean).abs()
}

/// Exponentially decayed average of `window` (oldest first), or `fallback`
/// when the window is empty.
pub fn decayed_feedback<'a>(window: impl DoubleEndedIterator<Item = &'a f64>, fallback: f64) -> f64 {
    let (weighted, total) = window
        .rev()
        .enumerate()
        .fold((0.0, 0.0), |(weighted, total), (i, &c)| {
            let w = (-(i as f64)).exp();
            (weighted + c * w, total + w)
        });
    if total == 0.0 { fallback } else { weighted / total }
}

/// Baseline mean, trailing coherence window and the last feedback value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineState {
    pub mean: f64,
    window: VecDeque<f64>,
    pub last_feedback: Option<f64>,
}

impl BaselineState {
    pub fn new(config: &BaselineConfig) -> Self {
        Self {
            mean: clamp_unit(config.initial_mean),
            window: VecDeque::with_capacity(config.window),
            last_feedback: None,
        }
    }

    /// Distance of `coherence` from the current mean.
    pub fn drift(&self, coherence: f64) -> f64 {
        baseline_drift(coherence, self.mean)
    }

    /// Past coherence values, oldest first.
    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Feedback the next update would produce, without applying it.
    pub fn feedback(&self, config: &BaselineConfig, density: f64) -> f64 {
        let mut feedback = decayed_feedback(self.window.iter(), self.mean);
        if config.information_curvature {
            feedback += (density - self.mean).powi(2) * config.curvature_scale;
        }
        clamp_unit(feedback)
    }

    /// Fold one exchange into the baseline. Returns the feedback used.
    pub fn update(&mut self, config: &BaselineConfig, coherence: f64, density: f64) -> f64 {
        let feedback = self.feedback(config, density);
        let alpha = config.smoothing.clamp(0.0, 1.0);
        self.mean = clamp_unit((1.0 - alpha) * self.mean + alpha * feedback);
        self.window.push_back(clamp_unit(coherence));
        while self.window.len() > config.window {
            self.window.pop_front();
        }
        self.last_feedback = Some(feedback);
        feedback
    }
}

impl Default for BaselineState {
    fn default() -> Self {
        Self::new(&BaselineConfig::default())
    }
}
