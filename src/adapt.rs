//! Adaptive weight control.
//!
//! When the observed drift exceeds a threshold every weight in a table grows
//! by `1 + gain · drift`, saturating at [`Weight::CEILING`]. An optional decay
//! path pulls every weight back down by a fixed amount per step, saturating
//! at [`Weight::FLOOR`]. Both paths go through [`WeightTable::map_weights`],
//! so the bounds hold no matter how many cycles run.
//!
//! [`Weight::CEILING`]: crate::axis::Weight::CEILING
//! [`Weight::FLOOR`]: crate::axis::Weight::FLOOR

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, WeightTable};

/// Which drift signal drives adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationSignal {
    /// Step size of the feature trajectory.
    #[default]
    Trajectory,
    /// Distance of the current coherence from the running baseline mean.
    Baseline,
}

/// Tuning for the weight controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    #[serde(default)]
    pub signal: AdaptationSignal,
    /// Drift above which weights grow (default: 0.3).
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Growth per unit of drift (default: 0.05).
    #[serde(default = "default_gain")]
    pub gain: f64,
    /// Amount subtracted from every weight each step; 0 disables decay.
    #[serde(default)]
    pub decay_rate: f64,
}

fn default_threshold() -> f64 {
    0.3
}
fn default_gain() -> f64 {
    0.05
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            signal: AdaptationSignal::default(),
            threshold: default_threshold(),
            gain: default_gain(),
            decay_rate: 0.0,
        }
    }
}

/// Applies drift-driven growth and per-step decay to weight tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightController {
    config: AdaptationConfig,
}

impl WeightController {
    pub fn new(config: AdaptationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    /// Whether `drift` is large enough to trigger growth.
    pub fn triggers(&self, drift: f64) -> bool {
        drift > self.config.threshold
    }

    /// Grow every weight by `1 + gain · drift` when drift exceeds the
    /// threshold. Returns the number of weights that changed.
    pub fn adapt<A: Axis>(&self, table: &mut WeightTable<A>, drift: f64) -> usize {
        if !self.triggers(drift) {
            return 0;
        }
        let factor = 1.0 + self.config.gain * drift;
        table.map_weights(|w| w * factor)
    }

    /// Subtract the decay rate from every weight. Returns the number of
    /// weights that changed.
    pub fn decay<A: Axis>(&self, table: &mut WeightTable<A>) -> usize {
        let rate = self.config.decay_rate;
        if rate <= 0.0 {
            return 0;
        }
        table.map_weights(|w| w - rate)
    }
}
