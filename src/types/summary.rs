//! Persisted per-day session summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionOutcome {
    Completed,
    TimedOut,
}

/// Outcome of the latest session for one game on one calendar day.
///
/// Only `score` and the two counters are mandatory on disk; older records
/// may lack the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[serde(default)]
    pub level: String,
    pub score: i64,
    #[serde(alias = "totalCorrect")]
    pub correct_answers: u32,
    #[serde(alias = "totalIncorrect")]
    pub incorrect_answers: u32,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub outcome: Option<SessionOutcome>,
    /// Items already matched in the current level
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solved: Vec<String>,
}

impl DailySummary {
    /// Share of correct answers among all attempts, `0.0` if none
    pub fn score_ratio(&self) -> f64 {
        let attempts = self.correct_answers as f64 + self.incorrect_answers as f64;
        if attempts == 0.0 {
            0.0
        } else {
            self.correct_answers as f64 / attempts
        }
    }
}
