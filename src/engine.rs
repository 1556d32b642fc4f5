//! Engine facade: the per-input pipeline, reviews and persistence.
//!
//! ```text
//! text → features → coherence → trajectory → baseline → weights → gate
//!      → (template + kernel | recall) → audit
//! ```
//!
//! [`Engine::process`] never fails. Every state change goes through
//! [`EngineState::apply`], and [`Engine::exchange`] returns the events it
//! applied so a run can be replayed.

use std::fmt;

use crate::adapt::{AdaptationSignal, WeightController};
use crate::audit::{AuditEntry, ExchangeRecord, review_text};
use crate::clock::{Clock, SystemClock};
use crate::coherence::coherence;
use crate::config::EngineConfig;
use crate::error::EunoiaResult;
use crate::features::{FeatureExtractor, FeatureScores, FeatureVector, tokenize};
use crate::gate::{self, GateDecision, GateInput};
use crate::mood::MoodState;
use crate::recall::MemoryEntry;
use crate::respond::{KernelContext, KernelInjector, ResponseSelector, compose};
use crate::snapshot::Snapshot;
use crate::state::{EngineState, Event, KernelLogEntry};
use crate::store::SnapshotStore;
use crate::trajectory::CoherenceSample;

/// Result of one processed input.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub record: ExchangeRecord,
    /// Events applied to the state, in order.
    pub events: Vec<Event>,
}

impl Exchange {
    pub fn response(&self) -> &str {
        &self.record.response
    }

    pub fn accepted(&self) -> bool {
        self.record.accepted()
    }
}

/// Scores for a text, computed without touching the state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePreview {
    pub scores: FeatureScores,
    pub features: FeatureVector,
    pub coherence: f64,
}

impl fmt::Display for ScorePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, coherence={:.4}", self.scores, self.coherence)
    }
}

/// Condensed view of the engine's self-model.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfSummary {
    pub identity: String,
    pub moral_mean: f64,
    pub logic_mean: f64,
    pub baseline_mean: f64,
    pub mood: MoodState,
    /// Last trajectory row (`features ++ [coherence]`).
    pub last_row: Option<Vec<f64>>,
    pub exchanges: u64,
}

impl fmt::Display for SelfSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Identity: {}", self.identity)?;
        writeln!(f, "Moral weight mean: {:.4}", self.moral_mean)?;
        writeln!(f, "Logic weight mean: {:.4}", self.logic_mean)?;
        writeln!(f, "Coherence baseline: {:.4}", self.baseline_mean)?;
        writeln!(
            f,
            "Mood: serenity={:.2}, conflict={:.2}, resolve={:.2}",
            self.mood.serenity, self.mood.conflict, self.mood.resolve
        )?;
        match &self.last_row {
            Some(row) => {
                let cells: Vec<String> = row.iter().map(|v| format!("{v:.4}")).collect();
                writeln!(f, "Last trajectory point: [{}]", cells.join(", "))?;
            }
            None => writeln!(f, "Last trajectory point: none")?,
        }
        write!(f, "Exchanges: {}", self.exchanges)
    }
}

/// The coherence engine.
pub struct Engine {
    config: EngineConfig,
    extractor: FeatureExtractor,
    selector: ResponseSelector,
    injector: KernelInjector,
    controller: WeightController,
    state: EngineState,
    clock: Box<dyn Clock>,
}

impl Engine {
    /// Create an engine reading wall-clock time.
    pub fn new(config: EngineConfig) -> EunoiaResult<Self> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Create an engine with an injected time source.
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> EunoiaResult<Self> {
        config.validate()?;
        tracing::info!(
            identity = %config.identity,
            dimension = config.features.axes.dimension(),
            gate = ?config.gate.rule,
            "initializing eunoia engine"
        );
        Ok(Self {
            extractor: FeatureExtractor::new(&config.features),
            selector: ResponseSelector::new(&config.responses),
            injector: KernelInjector::new(config.kernels.clone()),
            controller: WeightController::new(config.adaptation),
            state: EngineState::new(&config),
            clock,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Process one input and return the response text.
    pub fn process(&mut self, text: &str) -> String {
        self.exchange(text).record.response
    }

    /// Process one input and return full diagnostics.
    pub fn exchange(&mut self, text: &str) -> Exchange {
        let mut events = Vec::new();
        let timestamp = self.clock.now_millis();

        let scores = self
            .extractor
            .score(text, self.state.moral(), self.state.logic());
        let features = scores.project(self.extractor.axes());
        let coherence = coherence(&features);
        let baseline_drift = self.state.baseline().drift(coherence);

        self.commit(
            &mut events,
            Event::SampleRecorded(CoherenceSample::new(
                features.clone(),
                coherence,
                timestamp,
                tokenize(text).len(),
            )),
        );
        let trajectory_drift = self.state.trajectory().drift();
        let curvature = self.state.trajectory().curvature();

        self.commit(
            &mut events,
            Event::FeedbackApplied {
                coherence,
                density: scores.entropy,
            },
        );
        let feedback = self.state.baseline().last_feedback.unwrap_or(coherence);

        let signal = match self.config.adaptation.signal {
            AdaptationSignal::Trajectory => trajectory_drift,
            AdaptationSignal::Baseline => baseline_drift,
        };
        if self.controller.triggers(signal) {
            self.commit(&mut events, Event::WeightsAdapted { drift: signal });
        }
        if self.config.adaptation.decay_rate > 0.0 {
            self.commit(&mut events, Event::WeightsDecayed);
        }
        self.commit(
            &mut events,
            Event::IdentityLogged {
                timestamp,
                coherence,
            },
        );

        let decision = gate::evaluate(
            &self.config.gate,
            &GateInput {
                coherence,
                harmony: scores.harmony,
                curvature,
            },
        );

        let mut kernel = None;
        let response = match decision {
            GateDecision::Reject(reason) => {
                self.commit(&mut events, Event::GateRejected { reason });
                self.state
                    .memory()
                    .recall(&features)
                    .map(|hit| hit.entry.response.clone())
                    .unwrap_or_else(|| self.config.responses.recall_fallback.clone())
            }
            GateDecision::Accept => {
                self.commit(&mut events, Event::GateAccepted { coherence });
                let response = match self.selector.stillness(self.state.mood()) {
                    Some(stillness) => stillness.to_owned(),
                    None => {
                        let ctx =
                            KernelContext::new(scores.reflection, self.state.mood(), curvature);
                        kernel = self.injector.inject(text, &ctx).map(str::to_owned);
                        compose(self.selector.select(text), kernel.as_deref())
                    }
                };
                if let Some(k) = &kernel {
                    self.commit(
                        &mut events,
                        Event::KernelInjected(KernelLogEntry {
                            timestamp,
                            prompt: text.to_owned(),
                            kernel: k.clone(),
                        }),
                    );
                }
                self.commit(
                    &mut events,
                    Event::Remembered(MemoryEntry {
                        prompt: text.to_owned(),
                        response: response.clone(),
                        features: features.clone(),
                        timestamp,
                    }),
                );
                response
            }
        };

        let record = ExchangeRecord {
            prompt: text.to_owned(),
            response,
            scores,
            coherence,
            trajectory_drift,
            baseline_drift,
            curvature,
            feedback,
            decision,
            kernel,
            timestamp,
        };
        self.commit(&mut events, Event::Audited(AuditEntry::Exchange(record.clone())));

        tracing::debug!(
            coherence,
            drift = trajectory_drift,
            curvature,
            accepted = decision.is_accept(),
            "processed exchange"
        );
        Exchange { record, events }
    }

    fn commit(&mut self, events: &mut Vec<Event>, event: Event) {
        self.state.apply(&self.config, &event);
        events.push(event);
    }

    /// Apply a recorded event. Replaying an exchange's events onto an equal
    /// state reproduces the state after the exchange.
    pub fn replay(&mut self, event: &Event) {
        self.state.apply(&self.config, event);
    }

    /// Score a text against the current weights without recording anything.
    pub fn score(&self, text: &str) -> ScorePreview {
        let scores = self
            .extractor
            .score(text, self.state.moral(), self.state.logic());
        let features = scores.project(self.extractor.axes());
        let coherence = coherence(&features);
        ScorePreview {
            scores,
            features,
            coherence,
        }
    }

    /// Write a review of the last exchange into the audit log and return it.
    pub fn self_review(&mut self) -> Option<String> {
        let text = review_text(
            self.state.audit().last_exchange()?,
            self.config.review.low_coherence,
        );
        let timestamp = self.clock.now_millis();
        self.replay(&Event::Audited(AuditEntry::Review {
            timestamp,
            text: text.clone(),
        }));
        Some(text)
    }

    /// Realign when recent coherence has fallen below the baseline.
    /// Returns whether realignment happened.
    pub fn proactive_review(&mut self) -> bool {
        let review = self.config.review;
        let Some(average) = self.state.audit().recent_mean(review.proactive_span) else {
            return false;
        };
        let baseline = self.state.baseline().mean;
        if average >= baseline - review.proactive_margin {
            return false;
        }
        let timestamp = self.clock.now_millis();
        tracing::info!(average, baseline, "proactive review realigning weights");
        self.replay(&Event::ReviewRealigned {
            timestamp,
            average,
            baseline,
        });
        true
    }

    pub fn summary(&self) -> SelfSummary {
        let trajectory = self.state.trajectory();
        SelfSummary {
            identity: self.state.identity().label(),
            moral_mean: self.state.moral().mean(),
            logic_mean: self.state.logic().mean(),
            baseline_mean: self.state.baseline().mean,
            mood: *self.state.mood(),
            last_row: trajectory.rows().last().map(<[f64]>::to_vec),
            exchanges: trajectory.recorded(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.state.clone(), self.clock.now_millis())
    }

    /// Replace the state with a snapshot's. The memory cap and trajectory
    /// retention always follow the current config, not the snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.state;
        self.state.apply_limits(&self.config);
    }

    pub fn save_to(&self, store: &dyn SnapshotStore) -> EunoiaResult<()> {
        store.save(&self.snapshot()).inspect_err(|e| {
            tracing::warn!(error = %e, "failed to save snapshot");
        })?;
        tracing::info!(
            exchanges = self.state.trajectory().recorded(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Restore from a store. Returns `false` when the store is empty. On
    /// error the current state is kept.
    pub fn load_from(&mut self, store: &dyn SnapshotStore) -> EunoiaResult<bool> {
        let loaded = store.load().inspect_err(|e| {
            tracing::warn!(error = %e, "failed to load snapshot; keeping current state");
        })?;
        match loaded {
            Some(snapshot) => {
                tracing::info!(created_at = snapshot.created_at, "restored snapshot");
                self.restore(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("identity", &self.state.identity().label())
            .field("exchanges", &self.state.trajectory().recorded())
            .finish()
    }
}
