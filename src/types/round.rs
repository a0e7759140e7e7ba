//! Rounds, player input and outcomes

use serde::{Deserialize, Serialize};
use crate::types::{Category, Expression};

/// What the player has to solve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Challenge {
    /// Solve `lhs op rhs`
    Arithmetic(Expression),
    /// Repeat `sequence` after it has been played back
    Pattern {
        sequence: Vec<String>,
        /// Instrument set offered to the player
        choices: Vec<String>,
        reveal_ms: u64,
    },
    /// Pair each remaining item with its label
    Matching {
        /// Items not yet matched in this level
        targets: Vec<Category>,
        /// Full fixed label set, in presentation order
        labels: Vec<String>,
    },
}

/// A single generated challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number within the level
    pub number: u32,
    pub challenge: Challenge,
}

impl Round {
    /// Number of input tokens that completes the round
    pub fn expected_len(&self) -> usize {
        match &self.challenge {
            Challenge::Arithmetic(_) => 1,
            Challenge::Pattern { sequence, .. } => sequence.len(),
            Challenge::Matching { .. } => 1,
        }
    }

    /// Does the round need a playback before input opens?
    pub fn needs_reveal(&self) -> bool {
        matches!(self.challenge, Challenge::Pattern { .. })
    }

    /// Player-facing view
    pub fn view(&self) -> RoundView {
        match &self.challenge {
            Challenge::Arithmetic(expr) => RoundView {
                number: self.number,
                prompt: expr.to_string(),
                sequence: None,
                items: Vec::new(),
                choices: Vec::new(),
                expected_len: 1,
                reveal_ms: None,
            },
            Challenge::Pattern { sequence, choices, reveal_ms } => RoundView {
                number: self.number,
                prompt: "Watch the pattern, then repeat it".to_string(),
                sequence: Some(sequence.clone()),
                items: Vec::new(),
                choices: choices.clone(),
                expected_len: sequence.len(),
                reveal_ms: Some(*reveal_ms),
            },
            Challenge::Matching { targets, labels } => RoundView {
                number: self.number,
                prompt: "Match an emotion with its name".to_string(),
                sequence: None,
                items: targets.iter().map(|c| c.glyph.clone()).collect(),
                choices: labels.clone(),
                expected_len: 1,
                reveal_ms: None,
            },
        }
    }
}

/// What a renderer needs to show a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub number: u32,
    pub prompt: String,
    /// Playback sequence (pattern games only)
    pub sequence: Option<Vec<String>>,
    /// Items still to be placed (matching games only)
    pub items: Vec<String>,
    /// Buttons offered to the player
    pub choices: Vec<String>,
    pub expected_len: usize,
    pub reveal_ms: Option<u64>,
}

/// One unit of player input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputToken {
    Number { value: i64 },
    Symbol { value: String },
    Pair { item: String, label: String },
}

impl InputToken {
    pub fn number(value: i64) -> Self {
        Self::Number { value }
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Self::Symbol { value: value.into() }
    }

    pub fn pair(item: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Pair {
            item: item.into(),
            label: label.into(),
        }
    }
}

/// Result of matching input against a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub correct: bool,
}

impl Outcome {
    pub fn correct() -> Self {
        Self { correct: true }
    }

    pub fn incorrect() -> Self {
        Self { correct: false }
    }
}
