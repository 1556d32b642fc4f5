//! Axis identifiers and bounded weight tables.
//!
//! Value and logic axes are closed enums rather than free-form strings, so a
//! misspelled axis is a compile error. Each [`WeightTable`] maps an axis to a
//! [`Weight`] that can never leave `[1.0, 1.5]`, and keeps an append-only
//! per-axis history of every value it has held.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Weight
// ---------------------------------------------------------------------------

/// A table weight, bounded to `[Weight::FLOOR, Weight::CEILING]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight(f64);

/// Returned when a raw value outside the weight bounds is converted strictly.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("weight {value} is outside [1.0, 1.5]")]
pub struct WeightOutOfRange {
    pub value: f64,
}

impl Weight {
    /// Lowest value any weight may take.
    pub const FLOOR: Weight = Weight(1.0);
    /// Highest value any weight may take.
    pub const CEILING: Weight = Weight(1.5);

    /// Clamp an arbitrary value into the weight bounds. NaN maps to the floor.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::FLOOR;
        }
        Self(value.clamp(Self::FLOOR.0, Self::CEILING.0))
    }

    /// The raw value.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::FLOOR
    }
}

impl TryFrom<f64> for Weight {
    type Error = WeightOutOfRange;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if (Self::FLOOR.0..=Self::CEILING.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WeightOutOfRange { value })
        }
    }
}

impl From<Weight> for f64 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Axis identifiers
// ---------------------------------------------------------------------------

/// A closed set of labelled axes that can key a [`WeightTable`].
pub trait Axis:
    Copy + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Every axis in canonical order.
    const ALL: &'static [Self];

    /// Lower-case label matched against case-folded input text.
    fn label(self) -> &'static str;

    /// Look up an axis by its label.
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|axis| axis.label() == label)
    }
}

/// Value axes feeding the harmony score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoralAxis {
    Kindness,
    Fairness,
    Reflection,
    Wisdom,
    Empathy,
    Integrity,
}

impl MoralAxis {
    /// The four axes enabled by default.
    pub const DEFAULT_SET: [MoralAxis; 4] = [
        MoralAxis::Kindness,
        MoralAxis::Fairness,
        MoralAxis::Reflection,
        MoralAxis::Wisdom,
    ];
}

impl Axis for MoralAxis {
    const ALL: &'static [Self] = &[
        MoralAxis::Kindness,
        MoralAxis::Fairness,
        MoralAxis::Reflection,
        MoralAxis::Wisdom,
        MoralAxis::Empathy,
        MoralAxis::Integrity,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Kindness => "kindness",
            Self::Fairness => "fairness",
            Self::Reflection => "reflection",
            Self::Wisdom => "wisdom",
            Self::Empathy => "empathy",
            Self::Integrity => "integrity",
        }
    }
}

/// Logic axioms feeding the logic score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicAxiom {
    Noncontradiction,
    Identity,
    ExcludedMiddle,
    Causality,
    Coherence,
    Entanglement,
}

impl Axis for LogicAxiom {
    const ALL: &'static [Self] = &[
        LogicAxiom::Noncontradiction,
        LogicAxiom::Identity,
        LogicAxiom::ExcludedMiddle,
        LogicAxiom::Causality,
        LogicAxiom::Coherence,
        LogicAxiom::Entanglement,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Noncontradiction => "noncontradiction",
            Self::Identity => "identity",
            Self::ExcludedMiddle => "excluded_middle",
            Self::Causality => "causality",
            Self::Coherence => "coherence",
            Self::Entanglement => "entanglement",
        }
    }
}

impl fmt::Display for MoralAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for LogicAxiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Weight table
// ---------------------------------------------------------------------------

/// Per-axis bounded weights with an append-only change history.
///
/// The history is for audit only; nothing in the engine reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct WeightTable<A: Axis> {
    weights: BTreeMap<A, Weight>,
    history: BTreeMap<A, Vec<f64>>,
}

impl<A: Axis> WeightTable<A> {
    /// A table over the given axes, every weight at the floor.
    pub fn with_axes(axes: &[A]) -> Self {
        let weights = axes.iter().map(|&a| (a, Weight::FLOOR)).collect();
        let history = axes.iter().map(|&a| (a, vec![Weight::FLOOR.get()])).collect();
        Self { weights, history }
    }

    /// A table over every axis of `A`.
    pub fn all() -> Self {
        Self::with_axes(A::ALL)
    }

    pub fn get(&self, axis: A) -> Option<Weight> {
        self.weights.get(&axis).copied()
    }

    /// Overwrite one weight. Axes not in the table are ignored.
    pub fn set(&mut self, axis: A, weight: Weight) {
        if let Some(slot) = self.weights.get_mut(&axis) {
            if *slot != weight {
                *slot = weight;
                self.history.entry(axis).or_default().push(weight.get());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (A, Weight)> + '_ {
        self.weights.iter().map(|(&a, &w)| (a, w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Arithmetic mean of the weights, or 0 for an empty table.
    pub fn mean(&self) -> f64 {
        if self.weights.is_empty() {
            return 0.0;
        }
        self.weights.values().map(|w| w.get()).sum::<f64>() / self.weights.len() as f64
    }

    /// Recorded values for one axis, oldest first.
    pub fn history(&self, axis: A) -> &[f64] {
        self.history.get(&axis).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Apply `f` to every weight, saturating into bounds.
    ///
    /// Returns the number of weights whose value changed.
    pub fn map_weights(&mut self, f: impl Fn(f64) -> f64) -> usize {
        let mut changed = 0;
        for (axis, weight) in self.weights.iter_mut() {
            let next = Weight::saturating(f(weight.get()));
            if next != *weight {
                *weight = next;
                self.history.entry(*axis).or_default().push(next.get());
                changed += 1;
            }
        }
        changed
    }
}

impl<A: Axis> Default for WeightTable<A> {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_saturates_into_bounds() {
        assert_eq!(Weight::saturating(0.2), Weight::FLOOR);
        assert_eq!(Weight::saturating(9.0), Weight::CEILING);
        assert_eq!(Weight::saturating(f64::NAN), Weight::FLOOR);
        assert!((Weight::saturating(1.25).get() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_conversion_rejects_out_of_range() {
        assert!(Weight::try_from(1.2).is_ok());
        assert_eq!(
            Weight::try_from(1.7),
            Err(WeightOutOfRange { value: 1.7 })
        );
    }

    #[test]
    fn labels_round_trip() {
        for &axis in MoralAxis::ALL {
            assert_eq!(MoralAxis::from_label(axis.label()), Some(axis));
        }
        for &axiom in LogicAxiom::ALL {
            assert_eq!(LogicAxiom::from_label(axiom.label()), Some(axiom));
        }
        assert_eq!(MoralAxis::from_label("kindnes"), None);
    }

    #[test]
    fn map_weights_records_history_only_on_change() {
        let mut table = WeightTable::with_axes(&[MoralAxis::Kindness, MoralAxis::Wisdom]);
        assert_eq!(table.map_weights(|w| w * 1.1), 2);
        assert_eq!(table.history(MoralAxis::Kindness).len(), 2);

        // Already at the floor: subtracting changes nothing.
        let mut floor = WeightTable::with_axes(&[MoralAxis::Kindness]);
        assert_eq!(floor.map_weights(|w| w - 0.01), 0);
        assert_eq!(floor.history(MoralAxis::Kindness), &[1.0]);
    }

    #[test]
    fn set_ignores_axes_outside_table() {
        let mut table = WeightTable::with_axes(&[MoralAxis::Kindness]);
        table.set(MoralAxis::Empathy, Weight::CEILING);
        assert_eq!(table.get(MoralAxis::Empathy), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn table_serializes_with_label_keys() {
        let table = WeightTable::<LogicAxiom>::all();
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"excluded_middle\""));
        let back: WeightTable<LogicAxiom> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn out_of_range_weight_rejected_on_deserialize() {
        let json = r#"{"weights":{"kindness":2.0},"history":{}}"#;
        assert!(serde_json::from_str::<WeightTable<MoralAxis>>(json).is_err());
    }
}
