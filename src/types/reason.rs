//! Reason codes for session transitions

use serde::{Deserialize, Serialize};

/// Reason codes attached to every step output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum TransitionReason {
    // =========================================================================
    // G1xx: Session lifecycle
    // =========================================================================
    /// Session created, nothing started
    G100_SESSION_IDLE,
    /// Round generated and shown
    G110_ROUND_PRESENTED,
    /// Reveal finished, input open
    G120_INPUT_OPEN,
    /// Session reset to idle
    G130_SESSION_RESET,

    // =========================================================================
    // G2xx: Input
    // =========================================================================
    /// Input token accumulated, more expected
    G200_INPUT_ACCEPTED,
    /// Input arrived outside AWAITING_INPUT
    G201_INPUT_IGNORED,
    /// Submit with nothing accumulated
    G202_NOTHING_TO_SUBMIT,

    // =========================================================================
    // G3xx: Outcomes
    // =========================================================================
    /// Correct, next round
    G300_CORRECT_ADVANCING,
    /// Correct, level target reached
    G301_LEVEL_COMPLETE,
    /// Correct, last level finished
    G302_SESSION_COMPLETE,
    /// Incorrect, same round again
    G310_INCORRECT_RETRY,
    /// Incorrect, new round generated
    G311_INCORRECT_REGENERATED,

    // =========================================================================
    // G4xx: Clock
    // =========================================================================
    /// Countdown tick
    G400_TICK,
    /// Countdown expired
    G401_TIMED_OUT,
    /// Tick from a superseded timer, dropped
    G402_STALE_TICK,
    /// Countdown paused
    G410_PAUSED,
    /// Countdown resumed
    G411_RESUMED,

    // =========================================================================
    // G5xx: Terminal
    // =========================================================================
    /// Session already over, event dropped
    G500_SESSION_OVER,
}

impl TransitionReason {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::G100_SESSION_IDLE => "G100_SESSION_IDLE",
            Self::G110_ROUND_PRESENTED => "G110_ROUND_PRESENTED",
            Self::G120_INPUT_OPEN => "G120_INPUT_OPEN",
            Self::G130_SESSION_RESET => "G130_SESSION_RESET",
            Self::G200_INPUT_ACCEPTED => "G200_INPUT_ACCEPTED",
            Self::G201_INPUT_IGNORED => "G201_INPUT_IGNORED",
            Self::G202_NOTHING_TO_SUBMIT => "G202_NOTHING_TO_SUBMIT",
            Self::G300_CORRECT_ADVANCING => "G300_CORRECT_ADVANCING",
            Self::G301_LEVEL_COMPLETE => "G301_LEVEL_COMPLETE",
            Self::G302_SESSION_COMPLETE => "G302_SESSION_COMPLETE",
            Self::G310_INCORRECT_RETRY => "G310_INCORRECT_RETRY",
            Self::G311_INCORRECT_REGENERATED => "G311_INCORRECT_REGENERATED",
            Self::G400_TICK => "G400_TICK",
            Self::G401_TIMED_OUT => "G401_TIMED_OUT",
            Self::G402_STALE_TICK => "G402_STALE_TICK",
            Self::G410_PAUSED => "G410_PAUSED",
            Self::G411_RESUMED => "G411_RESUMED",
            Self::G500_SESSION_OVER => "G500_SESSION_OVER",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::G100_SESSION_IDLE => "Waiting to start",
            Self::G110_ROUND_PRESENTED => "New round presented",
            Self::G120_INPUT_OPEN => "Your turn",
            Self::G130_SESSION_RESET => "Session reset",
            Self::G200_INPUT_ACCEPTED => "Input accepted",
            Self::G201_INPUT_IGNORED => "Input ignored",
            Self::G202_NOTHING_TO_SUBMIT => "Nothing to submit",
            Self::G300_CORRECT_ADVANCING => "Correct! Great job!",
            Self::G301_LEVEL_COMPLETE => "Level complete",
            Self::G302_SESSION_COMPLETE => "All levels complete",
            Self::G310_INCORRECT_RETRY => "Oops! Try again!",
            Self::G311_INCORRECT_REGENERATED => "Incorrect, here is a new one",
            Self::G400_TICK => "Clock ticking",
            Self::G401_TIMED_OUT => "Time is up",
            Self::G402_STALE_TICK => "Stale tick dropped",
            Self::G410_PAUSED => "Paused",
            Self::G411_RESUMED => "Resumed",
            Self::G500_SESSION_OVER => "Session is over",
        }
    }
}

impl std::fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
