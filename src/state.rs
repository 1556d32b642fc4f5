//! Mutable engine state and the reducer that drives it.
//!
//! [`EngineState`] is only changed by [`EngineState::apply`], one [`Event`]
//! at a time. The engine records each event it applies, so an exchange can
//! be replayed onto a fresh state and reproduce the same result.

use serde::{Deserialize, Serialize};

use crate::adapt::WeightController;
use crate::audit::{AuditEntry, AuditLog, realignment_note};
use crate::axis::{LogicAxiom, MoralAxis, WeightTable};
use crate::baseline::BaselineState;
use crate::config::EngineConfig;
use crate::gate::RejectReason;
use crate::mood::{Identity, MoodState, Stability};
use crate::recall::{EpisodicMemory, MemoryEntry};
use crate::trajectory::{CoherenceSample, Trajectory};

/// One kernel injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelLogEntry {
    pub timestamp: u64,
    pub prompt: String,
    pub kernel: String,
}

/// Identity label and coherence at one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityLogEntry {
    pub timestamp: u64,
    pub coherence: f64,
    pub label: String,
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    SampleRecorded(CoherenceSample),
    /// Fold `coherence` into the baseline; `density` feeds the optional
    /// information-curvature term.
    FeedbackApplied { coherence: f64, density: f64 },
    WeightsAdapted { drift: f64 },
    WeightsDecayed,
    IdentityLogged { timestamp: u64, coherence: f64 },
    GateRejected { reason: RejectReason },
    GateAccepted { coherence: f64 },
    KernelInjected(KernelLogEntry),
    Remembered(MemoryEntry),
    Audited(AuditEntry),
    ReviewRealigned {
        timestamp: u64,
        average: f64,
        baseline: f64,
    },
}

/// Everything that persists between exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    moral: WeightTable<MoralAxis>,
    logic: WeightTable<LogicAxiom>,
    mood: MoodState,
    identity: Identity,
    baseline: BaselineState,
    trajectory: Trajectory,
    memory: EpisodicMemory,
    kernel_log: Vec<KernelLogEntry>,
    identity_log: Vec<IdentityLogEntry>,
    alignment_history: Vec<f64>,
    audit: AuditLog,
}

impl EngineState {
    /// Initial state for a configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            moral: config.moral_table(),
            logic: config.logic_table(),
            mood: MoodState::default(),
            identity: Identity::new(config.identity.clone()),
            baseline: BaselineState::new(&config.baseline),
            trajectory: Trajectory::new(config.retention),
            memory: EpisodicMemory::new(config.memory_capacity),
            kernel_log: Vec::new(),
            identity_log: Vec::new(),
            alignment_history: Vec::new(),
            audit: AuditLog::default(),
        }
    }

    /// Re-impose the configured memory cap and trajectory retention, e.g.
    /// on a state restored from a snapshot taken under another config.
    pub fn apply_limits(&mut self, config: &EngineConfig) {
        self.memory.set_capacity(config.memory_capacity);
        self.trajectory.set_policy(config.retention);
    }

    /// Apply one event.
    pub fn apply(&mut self, config: &EngineConfig, event: &Event) {
        match event {
            Event::SampleRecorded(sample) => {
                self.trajectory.push(sample.clone());
            }
            Event::FeedbackApplied { coherence, density } => {
                self.baseline.update(&config.baseline, *coherence, *density);
            }
            Event::WeightsAdapted { drift } => {
                self.adapt(config, *drift);
            }
            Event::WeightsDecayed => {
                let controller = WeightController::new(config.adaptation);
                controller.decay(&mut self.moral);
                controller.decay(&mut self.logic);
            }
            Event::IdentityLogged {
                timestamp,
                coherence,
            } => self.identity_log.push(IdentityLogEntry {
                timestamp: *timestamp,
                coherence: *coherence,
                label: self.identity.label(),
            }),
            Event::GateRejected { .. } => {
                self.mood
                    .unsettle(config.gate.conflict_step, config.gate.serenity_step);
                if config.gate.mark_unstable {
                    self.identity.stability = Stability::Unstable;
                }
            }
            Event::GateAccepted { coherence } => self.alignment_history.push(*coherence),
            Event::KernelInjected(entry) => self.kernel_log.push(entry.clone()),
            Event::Remembered(entry) => self.memory.remember(entry.clone()),
            Event::Audited(entry) => self.audit.push(entry.clone()),
            Event::ReviewRealigned {
                timestamp,
                average,
                baseline,
            } => {
                self.mood
                    .unsettle(config.review.conflict_step, config.review.serenity_step);
                self.adapt(config, config.review.realign_drift);
                self.audit.push(AuditEntry::Review {
                    timestamp: *timestamp,
                    text: realignment_note(*average, *baseline),
                });
            }
        }
    }

    fn adapt(&mut self, config: &EngineConfig, drift: f64) {
        let controller = WeightController::new(config.adaptation);
        controller.adapt(&mut self.moral, drift);
        controller.adapt(&mut self.logic, drift);
    }

    pub fn moral(&self) -> &WeightTable<MoralAxis> {
        &self.moral
    }

    pub fn logic(&self) -> &WeightTable<LogicAxiom> {
        &self.logic
    }

    pub fn mood(&self) -> &MoodState {
        &self.mood
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn baseline(&self) -> &BaselineState {
        &self.baseline
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn memory(&self) -> &EpisodicMemory {
        &self.memory
    }

    pub fn kernel_log(&self) -> &[KernelLogEntry] {
        &self.kernel_log
    }

    pub fn identity_log(&self) -> &[IdentityLogEntry] {
        &self.identity_log
    }

    /// Coherence of every accepted exchange, oldest first.
    pub fn alignment_history(&self) -> &[f64] {
        &self.alignment_history
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Weight;
    use crate::features::FeatureVector;

    #[test]
    fn rejection_unsettles_mood_and_marks_identity() {
        let config = EngineConfig::default();
        let mut state = EngineState::new(&config);
        state.apply(
            &config,
            &Event::GateRejected {
                reason: RejectReason::LowCoherence,
            },
        );
        assert!((state.mood().conflict - 0.2).abs() < 1e-12);
        assert!((state.mood().serenity - 0.8).abs() < 1e-12);
        assert_eq!(state.identity().label(), "Unstable Eunoia");
    }

    #[test]
    fn repeated_rejections_keep_mood_in_bounds() {
        let config = EngineConfig::default();
        let mut state = EngineState::new(&config);
        let event = Event::GateRejected {
            reason: RejectReason::LowHarmony,
        };
        for _ in 0..100 {
            state.apply(&config, &event);
            let mood = state.mood();
            for v in [mood.serenity, mood.conflict, mood.resolve] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
        assert_eq!(state.mood().serenity, 0.0);
        assert_eq!(state.mood().conflict, 1.0);
    }

    #[test]
    fn unmarked_identity_stays_stable() {
        let mut config = EngineConfig::default();
        config.gate.mark_unstable = false;
        let mut state = EngineState::new(&config);
        state.apply(
            &config,
            &Event::GateRejected {
                reason: RejectReason::LowHarmony,
            },
        );
        assert_eq!(state.identity().label(), "Eunoia");
    }

    #[test]
    fn identity_log_captures_current_label() {
        let config = EngineConfig::default();
        let mut state = EngineState::new(&config);
        state.apply(
            &config,
            &Event::IdentityLogged {
                timestamp: 1,
                coherence: 0.4,
            },
        );
        state.apply(
            &config,
            &Event::GateRejected {
                reason: RejectReason::LowCoherence,
            },
        );
        state.apply(
            &config,
            &Event::IdentityLogged {
                timestamp: 2,
                coherence: 0.1,
            },
        );
        let labels: Vec<_> = state.identity_log().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["Eunoia", "Unstable Eunoia"]);
    }

    #[test]
    fn weights_adapt_in_both_tables() {
        let config = EngineConfig::default();
        let mut state = EngineState::new(&config);
        state.apply(&config, &Event::WeightsAdapted { drift: 0.8 });
        assert!(state.moral().iter().all(|(_, w)| w > Weight::FLOOR));
        assert!(state.logic().iter().all(|(_, w)| w > Weight::FLOOR));
    }

    #[test]
    fn realignment_adds_review_note() {
        let config = EngineConfig::default();
        let mut state = EngineState::new(&config);
        state.apply(
            &config,
            &Event::ReviewRealigned {
                timestamp: 5,
                average: 0.2,
                baseline: 0.75,
            },
        );
        assert!((state.mood().conflict - 0.15).abs() < 1e-12);
        assert!((state.moral().mean() - 1.0175).abs() < 1e-12);
        assert_eq!(state.audit().reviews().count(), 1);
    }

    #[test]
    fn memory_respects_configured_capacity() {
        let mut config = EngineConfig::default();
        config.memory_capacity = Some(2);
        let mut state = EngineState::new(&config);
        for i in 0..5 {
            state.apply(
                &config,
                &Event::Remembered(MemoryEntry {
                    prompt: format!("p{i}"),
                    response: format!("r{i}"),
                    features: FeatureVector::new(vec![0.5, 0.5]),
                    timestamp: i,
                }),
            );
        }
        assert_eq!(state.memory().len(), 2);
    }
}
