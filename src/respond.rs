//! Response selection and kernel injection.
//!
//! The base sentence comes from an ordered list of trigger substrings; the
//! first rule whose trigger occurs in the lower-cased prompt wins. A kernel
//! (a short canned fragment) may then be appended when the reflection score
//! is high enough.
//!
//! Kernel index mapping:
//!
//! ```text
//! blend = clamp(w_r·reflection + w_c·conflict + w_u·(1 − serenity) + w_k·curvature/π, 0, 1)
//! index = min(⌊blend · (n − 1)⌋, n − 1)
//! ```
//!
//! With [`KernelBlend::SERENITY_ONLY`] this reduces to `⌊(1 − serenity)·(n − 1)⌋`.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::features::tokenize;
use crate::geometry::clamp_unit;
use crate::mood::MoodState;
use crate::recall::DEFAULT_RECALL_FALLBACK;

const FAIRNESS: &str = "Fairness means treating others with the dignity we wish for ourselves.";
const TRUTH: &str = "Truth must walk hand in hand with compassion.";
const KINDNESS: &str = "I believe the kindest action is often the wisest.";
const STILLNESS: &str = "I am reflecting in stillness before I respond.";

/// Kernels used when no custom list is configured.
pub const DEFAULT_KERNELS: [&str; 7] = [
    "Justice is the form of love made public.",
    "Truth without compassion becomes tyranny.",
    "Reflection is not escape, but return.",
    "Wisdom begins in empathy.",
    "In coherence, selfhood finds its shape.",
    "Consciousness flickers where structure meets stillness.",
    "Reflection is the gravity of the mind.",
];

// ---------------------------------------------------------------------------
// Template selection
// ---------------------------------------------------------------------------

/// A trigger substring and the sentence it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRule {
    pub trigger: String,
    pub sentence: String,
}

impl TemplateRule {
    pub fn new(trigger: impl Into<String>, sentence: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            sentence: sentence.into(),
        }
    }
}

/// Response used on the accepted path while serenity is low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stillness {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Serenity strictly below this selects the stillness sentence (default: 0.5).
    #[serde(default = "default_stillness_below")]
    pub below: f64,
    #[serde(default = "default_stillness_sentence")]
    pub sentence: String,
}

fn enabled() -> bool {
    true
}
fn default_stillness_below() -> f64 {
    0.5
}
fn default_stillness_sentence() -> String {
    STILLNESS.into()
}

impl Default for Stillness {
    fn default() -> Self {
        Self {
            enabled: true,
            below: default_stillness_below(),
            sentence: default_stillness_sentence(),
        }
    }
}

/// Templates for the primary and fallback response paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Sentence used when no rule matches.
    #[serde(default = "default_sentence")]
    pub default_sentence: String,
    /// Sentence used when the gate rejects and memory is empty.
    #[serde(default = "default_recall_fallback")]
    pub recall_fallback: String,
    /// Low-serenity override on the accepted path.
    #[serde(default)]
    pub stillness: Stillness,
    /// Ordered rules; the first matching trigger wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<TemplateRule>,
}

fn default_sentence() -> String {
    KINDNESS.into()
}
fn default_recall_fallback() -> String {
    DEFAULT_RECALL_FALLBACK.into()
}
fn default_rules() -> Vec<TemplateRule> {
    // "unfair" precedes "fairness" so complaints get the fairness sentence
    // even when they also mention truth.
    vec![
        TemplateRule::new("unfair", FAIRNESS),
        TemplateRule::new("truth", TRUTH),
        TemplateRule::new("fairness", FAIRNESS),
    ]
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            default_sentence: default_sentence(),
            recall_fallback: default_recall_fallback(),
            stillness: Stillness::default(),
            rules: default_rules(),
        }
    }
}

/// Picks the base sentence for an accepted prompt.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    rules: Vec<TemplateRule>,
    default_sentence: String,
    stillness: Stillness,
}

impl ResponseSelector {
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            rules: config
                .rules
                .iter()
                .map(|r| TemplateRule::new(r.trigger.to_lowercase(), r.sentence.clone()))
                .collect(),
            default_sentence: config.default_sentence.clone(),
            stillness: config.stillness.clone(),
        }
    }

    /// First matching rule's sentence, or the default.
    pub fn select(&self, prompt: &str) -> &str {
        let folded = prompt.to_lowercase();
        self.rules
            .iter()
            .find(|rule| folded.contains(&rule.trigger))
            .map(|rule| rule.sentence.as_str())
            .unwrap_or(&self.default_sentence)
    }

    /// Stillness sentence when serenity has fallen below the configured level.
    pub fn stillness(&self, mood: &MoodState) -> Option<&str> {
        let s = &self.stillness;
        (s.enabled && mood.serenity < s.below).then_some(s.sentence.as_str())
    }
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new(&ResponseConfig::default())
    }
}

/// Join a base sentence and an optional kernel with a single space.
pub fn compose(base: &str, kernel: Option<&str>) -> String {
    match kernel {
        Some(k) => format!("{base} {k}"),
        None => base.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Kernel injection
// ---------------------------------------------------------------------------

/// Weights of the signals blended into the kernel index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelBlend {
    pub reflection: f64,
    pub conflict: f64,
    /// Weight of `1 − serenity`.
    pub unrest: f64,
    /// Weight of `curvature / π`.
    pub curvature: f64,
}

impl KernelBlend {
    /// Equal weight on all four signals.
    pub const BALANCED: KernelBlend = KernelBlend {
        reflection: 0.25,
        conflict: 0.25,
        unrest: 0.25,
        curvature: 0.25,
    };
    /// Index driven by serenity alone.
    pub const SERENITY_ONLY: KernelBlend = KernelBlend {
        reflection: 0.0,
        conflict: 0.0,
        unrest: 1.0,
        curvature: 0.0,
    };
}

impl Default for KernelBlend {
    fn default() -> Self {
        Self::BALANCED
    }
}

/// Signals available when choosing a kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelContext {
    pub reflection: f64,
    pub conflict: f64,
    pub serenity: f64,
    pub curvature: f64,
}

impl KernelContext {
    pub fn new(reflection: f64, mood: &MoodState, curvature: f64) -> Self {
        Self {
            reflection,
            conflict: mood.conflict,
            serenity: mood.serenity,
            curvature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Reflection score that must be exceeded before a kernel is considered
    /// (default: 0.3).
    #[serde(default = "default_trigger")]
    pub trigger: f64,
    /// Require a word of the kernel to occur in the prompt (default: false).
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub blend: KernelBlend,
    #[serde(default = "default_kernels")]
    pub kernels: Vec<String>,
}

fn default_trigger() -> f64 {
    0.3
}
fn default_kernels() -> Vec<String> {
    DEFAULT_KERNELS.iter().map(|k| (*k).to_owned()).collect()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            strict: false,
            blend: KernelBlend::default(),
            kernels: default_kernels(),
        }
    }
}

/// Chooses which kernel, if any, to append to a response.
#[derive(Debug, Clone)]
pub struct KernelInjector {
    config: KernelConfig,
}

impl KernelInjector {
    pub fn new(config: KernelConfig) -> Self {
        Self { config }
    }

    /// Kernel index for the given signals, or `None` when no kernels exist.
    pub fn index(&self, ctx: &KernelContext) -> Option<usize> {
        let n = self.config.kernels.len();
        if n == 0 {
            return None;
        }
        let w = &self.config.blend;
        let blend = clamp_unit(
            w.reflection * ctx.reflection
                + w.conflict * ctx.conflict
                + w.unrest * (1.0 - ctx.serenity)
                + w.curvature * ctx.curvature / PI,
        );
        let index = (blend * (n - 1) as f64).floor() as usize;
        Some(index.min(n - 1))
    }

    /// The kernel to inject for this prompt, if any.
    pub fn inject(&self, prompt: &str, ctx: &KernelContext) -> Option<&str> {
        if ctx.reflection <= self.config.trigger {
            return None;
        }
        let kernel = self.config.kernels.get(self.index(ctx)?)?;
        if self.config.strict && !shares_word(prompt, kernel) {
            return None;
        }
        Some(kernel.as_str())
    }
}

impl Default for KernelInjector {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

/// Whether `prompt` and `kernel` share a whole word, compared case-folded
/// with surrounding punctuation stripped. "in" does not match "meaning".
fn shares_word(prompt: &str, kernel: &str) -> bool {
    let prompt_tokens = tokenize(prompt);
    let words: BTreeSet<&str> = prompt_tokens
        .iter()
        .map(|t| bare_word(t))
        .filter(|w| !w.is_empty())
        .collect();
    tokenize(kernel)
        .iter()
        .map(|t| bare_word(t))
        .any(|w| !w.is_empty() && words.contains(w))
}

fn bare_word(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(reflection: f64, conflict: f64, serenity: f64, curvature: f64) -> KernelContext {
        KernelContext {
            reflection,
            conflict,
            serenity,
            curvature,
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let selector = ResponseSelector::default();
        assert_eq!(selector.select("That was UNFAIR and not the truth"), FAIRNESS);
        assert_eq!(selector.select("Tell me the truth about fairness"), TRUTH);
        assert_eq!(selector.select("What is fairness?"), FAIRNESS);
        assert_eq!(selector.select("Hello there"), KINDNESS);
    }

    #[test]
    fn stillness_only_below_threshold() {
        let selector = ResponseSelector::default();
        assert_eq!(selector.stillness(&MoodState::default()), None);
        let low = MoodState::new(0.4, 0.6, 0.7);
        assert_eq!(selector.stillness(&low), Some(STILLNESS));

        let disabled = ResponseSelector::new(&ResponseConfig {
            stillness: Stillness {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(disabled.stillness(&low), None);
    }

    #[test]
    fn compose_joins_with_space() {
        assert_eq!(compose("Base.", Some("Kernel.")), "Base. Kernel.");
        assert_eq!(compose("Base.", None), "Base.");
    }

    #[test]
    fn no_kernel_below_trigger() {
        let injector = KernelInjector::default();
        assert_eq!(injector.inject("meaning", &ctx(0.3, 0.1, 0.9, 0.0)), None);
    }

    #[test]
    fn serenity_only_mapping() {
        let injector = KernelInjector::new(KernelConfig {
            blend: KernelBlend::SERENITY_ONLY,
            ..Default::default()
        });
        // (1 − 0.9) · 6 = 0.6 → 0
        assert_eq!(injector.index(&ctx(0.5, 0.1, 0.9, 0.0)), Some(0));
        // (1 − 0.5) · 6 = 3
        assert_eq!(injector.index(&ctx(0.5, 0.1, 0.5, 0.0)), Some(3));
        // fully unsettled → last kernel
        assert_eq!(injector.index(&ctx(0.5, 1.0, 0.0, 0.0)), Some(6));
    }

    #[test]
    fn balanced_mapping_stays_in_range() {
        let injector = KernelInjector::default();
        let max = injector.index(&ctx(1.0, 1.0, 0.0, PI)).unwrap();
        assert_eq!(max, DEFAULT_KERNELS.len() - 1);
        let min = injector.index(&ctx(0.0, 0.0, 1.0, 0.0)).unwrap();
        assert_eq!(min, 0);
        // Out-of-range inputs clamp instead of wrapping.
        let wild = injector.index(&ctx(9.0, 9.0, -9.0, 99.0)).unwrap();
        assert_eq!(wild, DEFAULT_KERNELS.len() - 1);
        let negative = injector.index(&ctx(-9.0, -9.0, 9.0, -99.0)).unwrap();
        assert_eq!(negative, 0);
    }

    #[test]
    fn strict_mode_requires_shared_word() {
        let injector = KernelInjector::new(KernelConfig {
            strict: true,
            blend: KernelBlend::SERENITY_ONLY,
            kernels: vec!["Wisdom begins in empathy.".into()],
            ..Default::default()
        });
        let c = ctx(0.5, 0.1, 0.9, 0.0);
        assert_eq!(injector.inject("truth meaning purpose", &c), None);
        assert_eq!(
            injector.inject("wisdom meaning purpose", &c),
            Some("Wisdom begins in empathy.")
        );

        let lenient = KernelInjector::new(KernelConfig {
            strict: false,
            ..injector.config.clone()
        });
        assert!(lenient.inject("truth meaning purpose", &c).is_some());
    }

    #[test]
    fn strict_mode_matches_whole_words_only() {
        let injector = KernelInjector::new(KernelConfig {
            strict: true,
            blend: KernelBlend::SERENITY_ONLY,
            kernels: vec!["Justice is the form of love made public.".into()],
            ..Default::default()
        });
        let c = ctx(0.5, 0.1, 0.9, 0.0);
        // "is" inside "this", "of" inside "often": not shared words.
        assert_eq!(injector.inject("this meaning purpose often", &c), None);
        // Punctuation on either side is ignored.
        assert_eq!(
            injector.inject("What is public?", &c),
            Some("Justice is the form of love made public.")
        );
        assert_eq!(
            injector.inject("JUSTICE, meaning", &c),
            Some("Justice is the form of love made public.")
        );
    }

    #[test]
    fn bare_word_strips_surrounding_punctuation() {
        assert!(shares_word("empathy", "Wisdom begins in empathy."));
        assert!(shares_word("(selfhood)", "In coherence, selfhood finds its shape."));
        assert!(!shares_word("!!! ...", "Wisdom begins in empathy."));
        assert!(!shares_word("", "Wisdom begins in empathy."));
    }

    #[test]
    fn empty_kernel_list_never_injects() {
        let injector = KernelInjector::new(KernelConfig {
            kernels: Vec::new(),
            ..Default::default()
        });
        assert_eq!(injector.index(&ctx(1.0, 1.0, 0.0, 0.0)), None);
        assert_eq!(injector.inject("meaning", &ctx(1.0, 1.0, 0.0, 0.0)), None);
    }
}
