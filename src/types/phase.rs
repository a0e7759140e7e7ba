//! Session phase definitions

use serde::{Deserialize, Serialize};

/// Phases of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Not started, or reset
    Idle,
    /// Round shown, reveal sequence still running
    Presenting,
    /// Collecting player input
    AwaitingInput,
    /// Input complete, outcome being decided
    Evaluating,
    /// Correct answer, next round on its way
    Advancing,
    /// Level target reached, next level on its way
    LevelComplete,
    /// All levels done (terminal)
    SessionComplete,
    /// Countdown expired (terminal)
    TimedOut,
}

impl SessionPhase {
    /// Terminal phases accept nothing but `reset`
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::SessionComplete | SessionPhase::TimedOut)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "\x1b[90m",                // Gray
            SessionPhase::Presenting => "\x1b[36m",          // Cyan
            SessionPhase::AwaitingInput => "\x1b[33m",       // Yellow
            SessionPhase::Evaluating
            | SessionPhase::Advancing
            | SessionPhase::LevelComplete => "\x1b[34m",     // Blue
            SessionPhase::SessionComplete => "\x1b[32m",     // Green
            SessionPhase::TimedOut => "\x1b[31m",            // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for phase
    pub fn emoji(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "⏸",
            SessionPhase::Presenting => "👀",
            SessionPhase::AwaitingInput => "✋",
            SessionPhase::Evaluating => "🤔",
            SessionPhase::Advancing => "➡",
            SessionPhase::LevelComplete => "⭐",
            SessionPhase::SessionComplete => "🎉",
            SessionPhase::TimedOut => "⏰",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "IDLE",
            SessionPhase::Presenting => "PRESENTING",
            SessionPhase::AwaitingInput => "AWAITING_INPUT",
            SessionPhase::Evaluating => "EVALUATING",
            SessionPhase::Advancing => "ADVANCING",
            SessionPhase::LevelComplete => "LEVEL_COMPLETE",
            SessionPhase::SessionComplete => "SESSION_COMPLETE",
            SessionPhase::TimedOut => "TIMED_OUT",
        };
        write!(f, "{}", name)
    }
}
