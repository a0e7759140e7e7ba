//! Output structures for every engine step

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{Outcome, SessionPhase, TransitionReason};

/// Snapshot of the session after one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Phase after the step
    pub phase: SessionPhase,
    /// Why the step ended where it did
    pub reason: TransitionReason,
    /// Current level name
    pub level: String,
    /// 0-based level index
    pub level_index: usize,
    pub score: i64,
    pub correct: u32,
    pub incorrect: u32,
    /// Seconds left on the countdown, `None` when untimed or stopped
    pub time_remaining: Option<u32>,
    /// Set when this step evaluated a round
    pub outcome: Option<Outcome>,
}

impl StepOutput {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.phase.color_code();
        let reset = SessionPhase::color_reset();
        let emoji = self.phase.emoji();

        format!(
            "{}{} {} | score={} | ✓{} ✗{} | {} | {}{}",
            color,
            emoji,
            self.level,
            self.score,
            self.correct,
            self.incorrect,
            self.time_display(),
            self.reason.description(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | level={} | score={} | correct={} | incorrect={} | time={} | reason={}",
            self.phase,
            self.level_index + 1,
            self.score,
            self.correct,
            self.incorrect,
            self.time_display(),
            self.reason.code()
        )
    }

    fn time_display(&self) -> String {
        match self.time_remaining {
            Some(secs) => format!("{}s", secs),
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(time_remaining: Option<u32>) -> StepOutput {
        StepOutput {
            timestamp: Utc::now(),
            phase: SessionPhase::AwaitingInput,
            reason: TransitionReason::G300_CORRECT_ADVANCING,
            level: "Level 2".to_string(),
            level_index: 1,
            score: 3,
            correct: 3,
            incorrect: 1,
            time_remaining,
            outcome: Some(Outcome::correct()),
        }
    }

    #[test]
    fn test_parseable_string() {
        assert_eq!(
            output(Some(42)).to_parseable_string(),
            "phase=AWAITING_INPUT | level=2 | score=3 | correct=3 | incorrect=1 | time=42s | reason=G300_CORRECT_ADVANCING"
        );
        assert!(output(None).to_parseable_string().contains("time=-"));
    }

    #[test]
    fn test_terminal_string_carries_description() {
        let s = output(Some(5)).to_terminal_string();
        assert!(s.contains("Correct! Great job!"));
        assert!(s.contains("Level 2"));
    }
}
