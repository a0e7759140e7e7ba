//! Error types for the session engine

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors surfaced by generation, persistence and configuration
#[derive(Error, Debug)]
pub enum GameError {
    /// Level descriptor cannot produce a valid round
    #[error("Invalid level descriptor: {0}")]
    InvalidLevelDescriptor(String),

    /// Persistence read/write failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored day entry does not match the summary schema
    #[error("Malformed stored entry {game}/{date}: {reason}")]
    MalformedStoredEntry {
        game: String,
        date: String,
        reason: String,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
