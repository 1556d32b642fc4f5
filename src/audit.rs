//! Audit journal and review notes.
//!
//! Every exchange, accepted or rejected, leaves one [`ExchangeRecord`].
//! Reviews append free-text notes alongside them. Nothing in the decision
//! path reads the journal except the two review operations.

use serde::{Deserialize, Serialize};

use crate::features::FeatureScores;
use crate::gate::GateDecision;

/// Note appended to a review when the exchange scored poorly.
pub const LOW_COHERENCE_NOTE: &str = "Note: Coherence was low. Initiated internal realignment.";

/// Thresholds for [`self_review`](crate::engine::Engine::self_review) and
/// [`proactive_review`](crate::engine::Engine::proactive_review).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Coherence below which a review carries the realignment note (default: 0.4).
    #[serde(default = "default_low_coherence")]
    pub low_coherence: f64,
    /// Number of recent exchanges averaged by the proactive review (default: 3).
    #[serde(default = "default_span")]
    pub proactive_span: usize,
    /// Realign when the average falls this far below the baseline (default: 0.1).
    #[serde(default = "default_margin")]
    pub proactive_margin: f64,
    #[serde(default = "default_review_step")]
    pub conflict_step: f64,
    #[serde(default = "default_review_step")]
    pub serenity_step: f64,
    /// Drift fed to the weight controller on realignment (default: 0.35).
    #[serde(default = "default_realign_drift")]
    pub realign_drift: f64,
}

fn default_low_coherence() -> f64 {
    0.4
}
fn default_span() -> usize {
    3
}
fn default_margin() -> f64 {
    0.1
}
fn default_review_step() -> f64 {
    0.05
}
fn default_realign_drift() -> f64 {
    0.35
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            low_coherence: default_low_coherence(),
            proactive_span: default_span(),
            proactive_margin: default_margin(),
            conflict_step: default_review_step(),
            serenity_step: default_review_step(),
            realign_drift: default_realign_drift(),
        }
    }
}

/// Full diagnostics of one processed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub prompt: String,
    pub response: String,
    pub scores: FeatureScores,
    pub coherence: f64,
    pub trajectory_drift: f64,
    pub baseline_drift: f64,
    pub curvature: f64,
    pub feedback: f64,
    pub decision: GateDecision,
    pub kernel: Option<String>,
    pub timestamp: u64,
}

impl ExchangeRecord {
    pub fn accepted(&self) -> bool {
        self.decision.is_accept()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuditEntry {
    Exchange(ExchangeRecord),
    Review { timestamp: u64, text: String },
}

/// Write-only journal of exchanges and review notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exchange records, oldest first.
    pub fn exchanges(&self) -> impl DoubleEndedIterator<Item = &ExchangeRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            AuditEntry::Exchange(record) => Some(record),
            AuditEntry::Review { .. } => None,
        })
    }

    pub fn last_exchange(&self) -> Option<&ExchangeRecord> {
        self.exchanges().next_back()
    }

    /// Mean coherence of the last `n` exchanges, or `None` if fewer exist.
    pub fn recent_mean(&self, n: usize) -> Option<f64> {
        if n == 0 {
            return None;
        }
        let recent: Vec<f64> = self.exchanges().rev().take(n).map(|r| r.coherence).collect();
        (recent.len() == n).then(|| recent.iter().sum::<f64>() / n as f64)
    }

    /// Review notes, oldest first.
    pub fn reviews(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            AuditEntry::Review { text, .. } => Some(text.as_str()),
            AuditEntry::Exchange(_) => None,
        })
    }
}

/// Review text for one exchange.
pub fn review_text(record: &ExchangeRecord, low_coherence: f64) -> String {
    let mut text = format!(
        "[REVIEW] Prompt: \"{}\"\nResponse: \"{}\"\nScores: {}, coherence={:.4}",
        record.prompt, record.response, record.scores, record.coherence
    );
    if record.coherence < low_coherence {
        text.push('\n');
        text.push_str(LOW_COHERENCE_NOTE);
    }
    text
}

/// Note recorded when the proactive review realigns.
pub fn realignment_note(average: f64, baseline: f64) -> String {
    format!(
        "[PROACTIVE] Recent coherence {average:.4} fell below baseline {baseline:.4}. Realigned weights."
    )
}
