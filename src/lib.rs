//! Playroom: mini-game session engine
//!
//! One state machine, parameterized per game by a `GameProfile`:
//! Round generator → countdown → input matcher → daily score store.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use error::{GameError, Result};

// =============================================================================
// TIMING
// =============================================================================

/// Countdown resolution (milliseconds)
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Capacity of the per-session event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// =============================================================================
// ARITHMETIC
// =============================================================================

/// Upper bound for both multiplication operands, whatever the level's range
pub const MULTIPLICATION_OPERAND_MAX: i64 = 5;

/// Largest accepted `max_number`; the sum of two operands must fit in an i64
pub const ARITHMETIC_OPERAND_MAX: i64 = i64::MAX / 2;

// =============================================================================
// STORE KEYS - one store per game identifier
// =============================================================================

pub const ARITHMETIC_STORE_KEY: &str = "arithmeticGameScores";
pub const EMOTION_STORE_KEY: &str = "emotionGameScores";
pub const PATTERNS_STORE_KEY: &str = "MusicalPatternsGame";

/// Date key format for daily summaries
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
