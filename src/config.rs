//! Runtime configuration: TOML file, then CLI overrides
//!
//! ```toml
//! store_dir = "./scores"
//! addr = "127.0.0.1:3000"
//! seed = 7
//! session_retention_secs = 300
//!
//! [[levels.arithmetic]]
//! name = "Warm-up"
//! rounds = 3
//! time_limit_secs = 30
//! [levels.arithmetic.difficulty]
//! kind = "arithmetic"
//! operators = ["+"]
//! max_number = 5
//! ```

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::core::generator::validate_level;
use crate::types::{GameKind, GameProfile, LevelDescriptor};
use crate::{GameError, Result};

pub const DEFAULT_STORE_DIR: &str = "./scores";
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 300;

/// Replacement level lists, per game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelOverrides {
    pub arithmetic: Option<Vec<LevelDescriptor>>,
    pub emotion: Option<Vec<LevelDescriptor>>,
    pub patterns: Option<Vec<LevelDescriptor>>,
}

impl LevelOverrides {
    fn get(&self, kind: GameKind) -> Option<&Vec<LevelDescriptor>> {
        match kind {
            GameKind::Arithmetic => self.arithmetic.as_ref(),
            GameKind::Emotion => self.emotion.as_ref(),
            GameKind::Patterns => self.patterns.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one JSON store per game
    pub store_dir: PathBuf,
    /// HTTP bind address
    pub addr: String,
    /// Fixed RNG seed for reproducible rounds
    pub seed: Option<u64>,
    /// How long the API keeps a finished session around
    pub session_retention_secs: u64,
    pub levels: LevelOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            addr: DEFAULT_ADDR.to_string(),
            seed: None,
            session_retention_secs: DEFAULT_SESSION_RETENTION_SECS,
            levels: LevelOverrides::default(),
        }
    }
}

impl Config {
    /// Load `path` if given, built-in defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GameError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// CLI flags win over file values
    pub fn with_overrides(mut self, store_dir: Option<PathBuf>, addr: Option<String>, seed: Option<u64>) -> Self {
        if let Some(dir) = store_dir {
            self.store_dir = dir;
        }
        if let Some(addr) = addr {
            self.addr = addr;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// Every overridden level list must be non-empty, generate valid rounds
    /// and fit its game's match rule
    pub fn validate(&self) -> Result<()> {
        for kind in GameKind::ALL {
            if let Some(levels) = self.levels.get(kind) {
                if levels.is_empty() {
                    return Err(GameError::Config(format!("levels.{} is empty", kind)));
                }
                for level in levels {
                    validate_level(level)?;
                }
                self.profile(kind).check_levels()?;
            }
        }
        Ok(())
    }

    /// Built-in profile with this config's level overrides applied
    pub fn profile(&self, kind: GameKind) -> GameProfile {
        let profile = GameProfile::builtin(kind);
        match self.levels.get(kind) {
            Some(levels) => profile.with_levels(levels.clone()),
            None => profile,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
