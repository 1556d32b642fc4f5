//! Feature extraction: raw text to bounded heuristic scores.
//!
//! Four scores are computed for every input:
//!
//! - **entropy** — unique-token ratio
//! - **reflection** — density of reflective keywords
//! - **harmony** — weighted substring alignment with the value axes
//! - **logic** — weighted substring alignment with the logic axioms
//!
//! All scores are clamped into `[0, 1]`. Tokenization is a whitespace split of
//! the lower-cased text; punctuation stays attached to tokens. Harmony and
//! logic use substring containment of the axis label, so "unfairness" counts
//! toward `fairness`. That is the intended heuristic.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, LogicAxiom, MoralAxis, WeightTable};
use crate::geometry::{self, EPSILON, clamp_unit};

/// Reflective keywords used when no custom set is configured.
pub const DEFAULT_REFLECTIVE_KEYWORDS: [&str; 13] = [
    "meaning",
    "purpose",
    "ethics",
    "truth",
    "existence",
    "value",
    "dignity",
    "justice",
    "compassion",
    "morality",
    "self",
    "awareness",
    "reflection",
];

/// Contribution of each matched value axis, scaled by its weight.
pub const DEFAULT_HARMONY_FACTOR: f64 = 0.25;
/// Contribution of each matched logic axiom, scaled by its weight.
pub const DEFAULT_LOGIC_FACTOR: f64 = 0.2;

// ---------------------------------------------------------------------------
// Stateless scoring functions
// ---------------------------------------------------------------------------

/// Lower-cased whitespace tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Unique-token ratio `|unique| / (|tokens| + ε)`, at most 1.
///
/// The empty string scores 0: no tokens, no diversity.
pub fn entropy(text: &str) -> f64 {
    let tokens = tokenize(text);
    let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
    clamp_unit(unique.len() as f64 / (tokens.len() as f64 + EPSILON))
}

/// Fraction of tokens that belong to `keywords`, at most 1.
pub fn reflection_score<S>(text: &str, keywords: &BTreeSet<S>) -> f64
where
    S: Ord + Borrow<str>,
{
    let tokens = tokenize(text);
    let hits = tokens
        .iter()
        .filter(|t| keywords.contains(t.as_str()))
        .count();
    clamp_unit(hits as f64 / tokens.len().max(1) as f64)
}

/// Sum of `weight * factor` over axes whose label occurs in the text.
pub fn alignment_score<A: Axis>(text: &str, table: &WeightTable<A>, factor: f64) -> f64 {
    let folded = text.to_lowercase();
    let sum: f64 = table
        .iter()
        .filter(|(axis, _)| folded.contains(axis.label()))
        .map(|(_, weight)| weight.get() * factor)
        .sum();
    clamp_unit(sum)
}

/// Value alignment with the default per-axis factor.
pub fn harmony_score(text: &str, table: &WeightTable<MoralAxis>) -> f64 {
    alignment_score(text, table, DEFAULT_HARMONY_FACTOR)
}

/// Logic alignment with the default per-axiom factor.
pub fn logic_score(text: &str, table: &WeightTable<LogicAxiom>) -> f64 {
    alignment_score(text, table, DEFAULT_LOGIC_FACTOR)
}

// ---------------------------------------------------------------------------
// Axes and vectors
// ---------------------------------------------------------------------------

/// One dimension of the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureAxis {
    Entropy,
    Reflection,
    Harmony,
    Logic,
}

impl FeatureAxis {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entropy => "entropy",
            Self::Reflection => "reflection",
            Self::Harmony => "harmony",
            Self::Logic => "logic",
        }
    }
}

/// Which optional axes take part in the feature vector.
///
/// Entropy and harmony are always present, so the dimension is 2 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSet {
    pub reflection: bool,
    pub logic: bool,
}

impl AxisSet {
    /// Entropy, reflection, harmony and logic.
    pub const FULL: AxisSet = AxisSet {
        reflection: true,
        logic: true,
    };
    /// Entropy, reflection and harmony.
    pub const MORAL: AxisSet = AxisSet {
        reflection: true,
        logic: false,
    };
    /// Entropy and harmony only.
    pub const MINIMAL: AxisSet = AxisSet {
        reflection: false,
        logic: false,
    };

    /// Enabled axes in canonical order.
    pub fn axes(&self) -> Vec<FeatureAxis> {
        let mut axes = vec![FeatureAxis::Entropy];
        if self.reflection {
            axes.push(FeatureAxis::Reflection);
        }
        axes.push(FeatureAxis::Harmony);
        if self.logic {
            axes.push(FeatureAxis::Logic);
        }
        axes
    }

    pub fn dimension(&self) -> usize {
        2 + usize::from(self.reflection) + usize::from(self.logic)
    }
}

impl Default for AxisSet {
    fn default() -> Self {
        Self::FULL
    }
}

/// All four raw scores for one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub entropy: f64,
    pub reflection: f64,
    pub harmony: f64,
    pub logic: f64,
}

impl FeatureScores {
    pub fn get(&self, axis: FeatureAxis) -> f64 {
        match axis {
            FeatureAxis::Entropy => self.entropy,
            FeatureAxis::Reflection => self.reflection,
            FeatureAxis::Harmony => self.harmony,
            FeatureAxis::Logic => self.logic,
        }
    }

    /// Project onto the enabled axes.
    pub fn project(&self, axes: AxisSet) -> FeatureVector {
        FeatureVector::new(axes.axes().into_iter().map(|a| self.get(a)).collect())
    }
}

impl fmt::Display for FeatureScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entropy={:.4}, reflection={:.4}, harmony={:.4}, logic={:.4}",
            self.entropy, self.reflection, self.harmony, self.logic
        )
    }
}

/// An ordered tuple of scores in `[0, 1]`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Build a vector, clamping every component into `[0, 1]`.
    pub fn new(components: Vec<f64>) -> Self {
        Self(components.into_iter().map(clamp_unit).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f64 {
        geometry::norm(&self.0)
    }

    /// Cosine similarity, or `None` when dimensions differ.
    pub fn cosine_similarity(&self, other: &FeatureVector) -> Option<f64> {
        (self.dimension() == other.dimension()).then(|| geometry::cosine(&self.0, &other.0))
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(components: Vec<f64>) -> Self {
        Self::new(components)
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(v: FeatureVector) -> Self {
        v.0
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Configuration for feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Optional axes included in the feature vector.
    #[serde(default)]
    pub axes: AxisSet,
    /// Keywords counted by the reflection score.
    #[serde(default = "default_keywords")]
    pub reflective_keywords: Vec<String>,
    /// Per-axis factor for the harmony score.
    #[serde(default = "default_harmony_factor")]
    pub harmony_factor: f64,
    /// Per-axiom factor for the logic score.
    #[serde(default = "default_logic_factor")]
    pub logic_factor: f64,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_REFLECTIVE_KEYWORDS.iter().map(|k| (*k).to_owned()).collect()
}
fn default_harmony_factor() -> f64 {
    DEFAULT_HARMONY_FACTOR
}
fn default_logic_factor() -> f64 {
    DEFAULT_LOGIC_FACTOR
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            axes: AxisSet::default(),
            reflective_keywords: default_keywords(),
            harmony_factor: default_harmony_factor(),
            logic_factor: default_logic_factor(),
        }
    }
}

/// Scores text against the current weight tables.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    keywords: BTreeSet<String>,
    harmony_factor: f64,
    logic_factor: f64,
    axes: AxisSet,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            keywords: config
                .reflective_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            harmony_factor: config.harmony_factor,
            logic_factor: config.logic_factor,
            axes: config.axes,
        }
    }

    pub fn axes(&self) -> AxisSet {
        self.axes
    }

    /// Compute all four scores. The logic score is computed even when the
    /// logic axis is disabled; it just stays out of the vector.
    pub fn score(
        &self,
        text: &str,
        moral: &WeightTable<MoralAxis>,
        logic: &WeightTable<LogicAxiom>,
    ) -> FeatureScores {
        FeatureScores {
            entropy: entropy(text),
            reflection: reflection_score(text, &self.keywords),
            harmony: alignment_score(text, moral, self.harmony_factor),
            logic: alignment_score(text, logic, self.logic_factor),
        }
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&FeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Weight;

    fn moral_four() -> WeightTable<MoralAxis> {
        WeightTable::with_axes(&MoralAxis::DEFAULT_SET)
    }

    #[test]
    fn entropy_of_empty_text_is_zero() {
        assert_eq!(entropy(""), 0.0);
        assert_eq!(entropy("   \t\n"), 0.0);
    }

    #[test]
    fn entropy_penalizes_repetition() {
        let distinct = entropy("one two three four");
        let repeated = entropy("one one one one");
        assert!(distinct > 0.99 && distinct < 1.0);
        assert!((repeated - 1.0 / 4.005).abs() < 1e-12);
    }

    #[test]
    fn entropy_is_case_folded() {
        assert!((entropy("Truth truth") - entropy("truth truth")).abs() < 1e-12);
    }

    #[test]
    fn reflection_counts_keyword_tokens() {
        let keywords: BTreeSet<String> = default_keywords().into_iter().collect();
        let score = reflection_score("Truth and meaning matter", &keywords);
        assert!((score - 0.5).abs() < 1e-12);
        // Punctuation stays on the token.
        assert_eq!(reflection_score("truth?", &keywords), 0.0);
        assert_eq!(reflection_score("", &keywords), 0.0);
    }

    #[test]
    fn harmony_single_match() {
        let h = harmony_score("Justice and fairness matter.", &moral_four());
        assert!((h - 0.25).abs() < 1e-12);
    }

    #[test]
    fn harmony_two_matches() {
        let h = harmony_score("Justice and fairness need wisdom.", &moral_four());
        assert!((h - 0.5).abs() < 1e-12);
    }

    #[test]
    fn harmony_uses_substring_containment() {
        // "unfairness" contains "fairness".
        let h = harmony_score("pure unfairness", &moral_four());
        assert!((h - 0.25).abs() < 1e-12);
    }

    #[test]
    fn harmony_scales_with_weight_and_clamps() {
        let mut table = moral_four();
        table.set(MoralAxis::Fairness, Weight::CEILING);
        let h = harmony_score("fairness", &table);
        assert!((h - 0.375).abs() < 1e-12);

        let mut heavy = moral_four();
        heavy.map_weights(|_| 1.5);
        let all = harmony_score("kindness fairness reflection wisdom", &heavy);
        assert_eq!(all, 1.0);
    }

    #[test]
    fn logic_score_uses_its_own_factor() {
        let table = WeightTable::<LogicAxiom>::all();
        let l = logic_score("noncontradiction supports coherence", &table);
        assert!((l - 0.4).abs() < 1e-12);
    }

    #[test]
    fn projection_follows_axis_set() {
        let scores = FeatureScores {
            entropy: 0.9,
            reflection: 0.2,
            harmony: 0.5,
            logic: 0.1,
        };
        assert_eq!(scores.project(AxisSet::FULL).as_slice(), &[0.9, 0.2, 0.5, 0.1]);
        assert_eq!(scores.project(AxisSet::MORAL).as_slice(), &[0.9, 0.2, 0.5]);
        assert_eq!(scores.project(AxisSet::MINIMAL).as_slice(), &[0.9, 0.5]);
        assert_eq!(AxisSet::MINIMAL.dimension(), 2);
    }

    #[test]
    fn vector_components_are_clamped() {
        let v = FeatureVector::new(vec![-0.1, 1.7, f64::NAN]);
        assert_eq!(v.as_slice(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn extractor_scores_all_axes() {
        let extractor = FeatureExtractor::default();
        let scores = extractor.score(
            "What is the meaning of fairness and causality?",
            &moral_four(),
            &WeightTable::all(),
        );
        assert!(scores.entropy > 0.9);
        assert!(scores.reflection > 0.0);
        assert!((scores.harmony - 0.25).abs() < 1e-12);
        assert!((scores.logic - 0.2).abs() < 1e-12);
    }
}
