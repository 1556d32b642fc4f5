//! Engine configuration, persisted as TOML.
//!
//! Every field has a serde default, so a config file only needs to name the
//! values it changes. [`EngineConfig::validate`] runs before an engine is
//! built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adapt::AdaptationConfig;
use crate::audit::ReviewConfig;
use crate::axis::{Axis, LogicAxiom, MoralAxis, WeightTable};
use crate::baseline::BaselineConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::features::FeatureConfig;
use crate::gate::GateConfig;
use crate::respond::{KernelConfig, ResponseConfig};
use crate::trajectory::{MIN_WINDOW, RetentionPolicy};

/// Configuration for one [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Name shown in the identity label (default: "Eunoia").
    #[serde(default = "default_identity")]
    pub identity: String,
    /// Value axes feeding the harmony score.
    #[serde(default = "default_moral_axes")]
    pub moral_axes: Vec<MoralAxis>,
    /// Logic axioms feeding the logic score.
    #[serde(default = "default_logic_axes")]
    pub logic_axes: Vec<LogicAxiom>,
    /// Maximum remembered exchanges. `None` keeps everything.
    #[serde(default)]
    pub memory_capacity: Option<usize>,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub adaptation: AdaptationConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub responses: ResponseConfig,
    #[serde(default)]
    pub kernels: KernelConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

fn default_identity() -> String {
    "Eunoia".into()
}
fn default_moral_axes() -> Vec<MoralAxis> {
    MoralAxis::DEFAULT_SET.to_vec()
}
fn default_logic_axes() -> Vec<LogicAxiom> {
    LogicAxiom::ALL.to_vec()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            moral_axes: default_moral_axes(),
            logic_axes: default_logic_axes(),
            memory_capacity: None,
            retention: RetentionPolicy::default(),
            features: FeatureConfig::default(),
            adaptation: AdaptationConfig::default(),
            gate: GateConfig::default(),
            baseline: BaselineConfig::default(),
            responses: ResponseConfig::default(),
            kernels: KernelConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Fresh moral weight table over the configured axes.
    pub fn moral_table(&self) -> WeightTable<MoralAxis> {
        WeightTable::with_axes(&self.moral_axes)
    }

    /// Fresh logic weight table over the configured axioms.
    pub fn logic_table(&self) -> WeightTable<LogicAxiom> {
        WeightTable::with_axes(&self.logic_axes)
    }

    /// Reject values that would break the engine's bounds.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.identity.trim().is_empty() {
            return invalid("identity must not be empty");
        }
        if self.moral_axes.is_empty() {
            return invalid("moral_axes must name at least one axis");
        }
        if self.memory_capacity == Some(0) {
            return invalid("memory_capacity must be > 0 when set");
        }
        if let RetentionPolicy::Window(n) = self.retention {
            if n < MIN_WINDOW {
                return invalid(format!("retention window must be >= {MIN_WINDOW}, got {n}"));
            }
        }

        non_negative("features.harmony_factor", self.features.harmony_factor)?;
        non_negative("features.logic_factor", self.features.logic_factor)?;

        non_negative("adaptation.threshold", self.adaptation.threshold)?;
        non_negative("adaptation.gain", self.adaptation.gain)?;
        non_negative("adaptation.decay_rate", self.adaptation.decay_rate)?;

        unit("gate.min_coherence", self.gate.min_coherence)?;
        unit("gate.min_harmony", self.gate.min_harmony)?;
        if !(0.0..=std::f64::consts::PI).contains(&self.gate.max_curvature) {
            return invalid(format!(
                "gate.max_curvature must be within [0, π], got {}",
                self.gate.max_curvature
            ));
        }
        unit("gate.conflict_step", self.gate.conflict_step)?;
        unit("gate.serenity_step", self.gate.serenity_step)?;

        if self.baseline.window == 0 {
            return invalid("baseline.window must be > 0");
        }
        unit("baseline.initial_mean", self.baseline.initial_mean)?;
        unit("baseline.smoothing", self.baseline.smoothing)?;
        non_negative("baseline.curvature_scale", self.baseline.curvature_scale)?;

        unit("responses.stillness.below", self.responses.stillness.below)?;
        if self.responses.rules.iter().any(|r| r.trigger.trim().is_empty()) {
            return invalid("responses.rules triggers must not be empty");
        }

        unit("kernels.trigger", self.kernels.trigger)?;
        let blend = &self.kernels.blend;
        for (name, w) in [
            ("kernels.blend.reflection", blend.reflection),
            ("kernels.blend.conflict", blend.conflict),
            ("kernels.blend.unrest", blend.unrest),
            ("kernels.blend.curvature", blend.curvature),
        ] {
            non_negative(name, w)?;
        }

        unit("review.low_coherence", self.review.low_coherence)?;
        if self.review.proactive_span == 0 {
            return invalid("review.proactive_span must be > 0");
        }
        non_negative("review.proactive_margin", self.review.proactive_margin)?;
        unit("review.conflict_step", self.review.conflict_step)?;
        unit("review.serenity_step", self.review.serenity_step)?;
        non_negative("review.realign_drift", self.review.realign_drift)?;
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Load from a TOML file, or the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml().map_err(|message| ConfigError::Serialize {
            path: path.display().to_string(),
            message,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

fn invalid(message: impl Into<String>) -> ConfigResult<()> {
    Err(ConfigError::Invalid {
        message: message.into(),
    })
}

fn non_negative(name: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be a finite value >= 0, got {value}"))
    }
}

fn unit(name: &str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        invalid(format!("{name} must be within [0, 1], got {value}"))
    }
}
