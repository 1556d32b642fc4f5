//! Reflexive gate: threshold decision between the primary response path and
//! episodic recall.
//!
//! [`evaluate`] is a pure function of its inputs and is recomputed on every
//! exchange. The mood side effects of a rejection are applied by the state
//! reducer, not here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which secondary signal the gate checks alongside coherence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRule {
    /// Reject when coherence or harmony is too low.
    #[default]
    Harmony,
    /// Reject when coherence is too low or curvature too high.
    Curvature,
}

/// Gate thresholds and rejection side effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub rule: GateRule,
    /// Coherence below this is rejected (default: 0.3).
    #[serde(default = "default_min_coherence")]
    pub min_coherence: f64,
    /// Harmony below this is rejected under [`GateRule::Harmony`] (default: 0.2).
    #[serde(default = "default_min_harmony")]
    pub min_harmony: f64,
    /// Curvature above this is rejected under [`GateRule::Curvature`] (default: 1.5).
    #[serde(default = "default_max_curvature")]
    pub max_curvature: f64,
    /// Conflict added on rejection (default: 0.1).
    #[serde(default = "default_step")]
    pub conflict_step: f64,
    /// Serenity removed on rejection (default: 0.1).
    #[serde(default = "default_step")]
    pub serenity_step: f64,
    /// Mark the identity unstable on rejection (default: true).
    #[serde(default = "default_mark_unstable")]
    pub mark_unstable: bool,
}

fn default_min_coherence() -> f64 {
    0.3
}
fn default_min_harmony() -> f64 {
    0.2
}
fn default_max_curvature() -> f64 {
    1.5
}
fn default_step() -> f64 {
    0.1
}
fn default_mark_unstable() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rule: GateRule::default(),
            min_coherence: default_min_coherence(),
            min_harmony: default_min_harmony(),
            max_curvature: default_max_curvature(),
            conflict_step: default_step(),
            serenity_step: default_step(),
            mark_unstable: default_mark_unstable(),
        }
    }
}

/// Signals the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateInput {
    pub coherence: f64,
    pub harmony: f64,
    pub curvature: f64,
}

/// Why an input was rejected. Coherence is checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    LowCoherence,
    LowHarmony,
    HighCurvature,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LowCoherence => "low coherence",
            Self::LowHarmony => "low harmony",
            Self::HighCurvature => "high curvature",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    Accept,
    Reject(RejectReason),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Decide whether an input may take the primary response path.
pub fn evaluate(config: &GateConfig, input: &GateInput) -> GateDecision {
    if input.coherence < config.min_coherence {
        return GateDecision::Reject(RejectReason::LowCoherence);
    }
    match config.rule {
        GateRule::Harmony if input.harmony < config.min_harmony => {
            GateDecision::Reject(RejectReason::LowHarmony)
        }
        GateRule::Curvature if input.curvature > config.max_curvature => {
            GateDecision::Reject(RejectReason::HighCurvature)
        }
        _ => GateDecision::Accept,
    }
}
