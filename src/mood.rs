//! Agent mood and identity label.
//!
//! Mood is three scalars that the gate and the proactive review nudge. Every
//! component is clamped to `[0, 1]` after every change, so repeated gate
//! failures saturate instead of drifting out of range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::clamp_unit;

/// Serenity, conflict and resolve, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodState {
    pub serenity: f64,
    pub conflict: f64,
    pub resolve: f64,
}

impl MoodState {
    pub fn new(serenity: f64, conflict: f64, resolve: f64) -> Self {
        Self {
            serenity: clamp_unit(serenity),
            conflict: clamp_unit(conflict),
            resolve: clamp_unit(resolve),
        }
    }

    /// Raise conflict and lower serenity by the given amounts, clamped.
    pub fn unsettle(&mut self, conflict_step: f64, serenity_step: f64) {
        self.conflict = clamp_unit(self.conflict + conflict_step);
        self.serenity = clamp_unit(self.serenity - serenity_step);
    }

    /// `1 − serenity`.
    pub fn unrest(&self) -> f64 {
        1.0 - self.serenity
    }
}

impl Default for MoodState {
    fn default() -> Self {
        Self::new(0.9, 0.1, 0.7)
    }
}

/// Whether the agent has been marked unstable by a gate rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    #[default]
    Stable,
    Unstable,
}

/// The agent's name and its current stability label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub stability: Stability,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stability: Stability::Stable,
        }
    }

    /// Display label, e.g. `Eunoia` or `Unstable Eunoia`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stability {
            Stability::Stable => write!(f, "{}", self.name),
            Stability::Unstable => write!(f, "Unstable {}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mood_matches_initial_state() {
        let mood = MoodState::default();
        assert_eq!(mood.serenity, 0.9);
        assert_eq!(mood.conflict, 0.1);
        assert_eq!(mood.resolve, 0.7);
    }

    #[test]
    fn unsettle_saturates() {
        let mut mood = MoodState::default();
        for _ in 0..50 {
            mood.unsettle(0.1, 0.1);
        }
        assert_eq!(mood.conflict, 1.0);
        assert_eq!(mood.serenity, 0.0);
        assert!((mood.unrest() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identity_label_tracks_stability() {
        let mut identity = Identity::new("Eunoia");
        assert_eq!(identity.label(), "Eunoia");
        identity.stability = Stability::Unstable;
        assert_eq!(identity.label(), "Unstable Eunoia");
    }
}
