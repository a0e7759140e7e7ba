//! Game profiles: the configuration bundle that specializes the engine

use serde::{Deserialize, Serialize};
use crate::types::{Category, Difficulty, LevelDescriptor, Operator};
use crate::{GameError, Result};
use crate::{ARITHMETIC_STORE_KEY, EMOTION_STORE_KEY, PATTERNS_STORE_KEY};

/// The built-in mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Arithmetic,
    Emotion,
    Patterns,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Arithmetic, GameKind::Emotion, GameKind::Patterns];

    /// Identifier of this game's daily score store
    pub fn store_key(&self) -> &'static str {
        match self {
            GameKind::Arithmetic => ARITHMETIC_STORE_KEY,
            GameKind::Emotion => EMOTION_STORE_KEY,
            GameKind::Patterns => PATTERNS_STORE_KEY,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::Arithmetic => "Basic Arithmetic Adventure",
            GameKind::Emotion => "Emotion Recognition",
            GameKind::Patterns => "Musical Patterns",
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameKind::Arithmetic => "arithmetic",
            GameKind::Emotion => "emotion",
            GameKind::Patterns => "patterns",
        };
        write!(f, "{}", name)
    }
}

/// Equality rule used by the input matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRule {
    /// Integer answer equals the evaluated expression
    NumericEquality,
    /// Same length, same symbol at every position
    OrderedSequence,
    /// Label string equality for one item, order-free
    UnorderedLabels,
}

impl MatchRule {
    /// Can rounds of this difficulty ever be answered under this rule?
    pub fn accepts(&self, difficulty: &Difficulty) -> bool {
        matches!(
            (self, difficulty),
            (MatchRule::NumericEquality, Difficulty::Arithmetic { .. })
                | (MatchRule::OrderedSequence, Difficulty::Pattern { .. })
                | (MatchRule::UnorderedLabels, Difficulty::Matching { .. })
        )
    }
}

/// How wrong answers affect the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringRule {
    /// score counts correct answers in the level
    CorrectOnly,
    /// score = correct - incorrect
    PenalizeIncorrect,
}

/// What happens to a round after a wrong answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// Keep the round, clear the input
    Retry,
    /// Generate a fresh round
    Regenerate,
}

/// What the countdown budget covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerScope {
    /// Untimed
    None,
    /// One budget per level, re-armed on level change
    Level,
    /// One budget per round, re-armed for every new round
    Round,
}

/// Whether today's stored counters seed a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumePolicy {
    Fresh,
    /// Restore today's counters unless that session already ended
    Resume,
}

/// Everything the engine needs to run one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProfile {
    pub kind: GameKind,
    /// Key of the daily score store this game writes to
    pub store_key: String,
    pub levels: Vec<LevelDescriptor>,
    pub match_rule: MatchRule,
    pub scoring: ScoringRule,
    pub retry: RetryPolicy,
    pub timer_scope: TimerScope,
    pub resume: ResumePolicy,
}

impl GameProfile {
    /// Built-in profile for a game
    pub fn builtin(kind: GameKind) -> Self {
        match kind {
            GameKind::Arithmetic => Self::arithmetic(),
            GameKind::Emotion => Self::emotion(),
            GameKind::Patterns => Self::patterns(),
        }
    }

    /// Three timed levels; wrong answers get a new question, no penalty
    pub fn arithmetic() -> Self {
        use Operator::*;
        Self {
            kind: GameKind::Arithmetic,
            store_key: GameKind::Arithmetic.store_key().to_string(),
            levels: vec![
                LevelDescriptor::arithmetic("Level 1", &[Add, Subtract], 10, 5, 60),
                LevelDescriptor::arithmetic("Level 2", &[Add, Subtract, Multiply], 15, 7, 90),
                LevelDescriptor::arithmetic("Level 3", &[Add, Subtract, Multiply], 20, 10, 120),
            ],
            match_rule: MatchRule::NumericEquality,
            scoring: ScoringRule::CorrectOnly,
            retry: RetryPolicy::Regenerate,
            timer_scope: TimerScope::Level,
            resume: ResumePolicy::Fresh,
        }
    }

    /// Untimed, single level; every wrong match costs a point
    pub fn emotion() -> Self {
        let categories = default_emotions();
        let rounds = categories.len() as u32;
        Self {
            kind: GameKind::Emotion,
            store_key: GameKind::Emotion.store_key().to_string(),
            levels: vec![LevelDescriptor::matching("Emotions", categories, rounds)],
            match_rule: MatchRule::UnorderedLabels,
            scoring: ScoringRule::PenalizeIncorrect,
            retry: RetryPolicy::Retry,
            timer_scope: TimerScope::None,
            resume: ResumePolicy::Resume,
        }
    }

    /// Three levels of growing pattern length, 30 seconds per pattern
    pub fn patterns() -> Self {
        let instruments = ["piano", "guitar", "drum", "trumpet"];
        Self {
            kind: GameKind::Patterns,
            store_key: GameKind::Patterns.store_key().to_string(),
            levels: vec![
                LevelDescriptor::pattern("Level 1", &instruments, 3, 1000, 3, 30),
                LevelDescriptor::pattern("Level 2", &instruments, 5, 800, 3, 30),
                LevelDescriptor::pattern("Level 3", &instruments, 7, 600, 3, 30),
            ],
            match_rule: MatchRule::OrderedSequence,
            scoring: ScoringRule::CorrectOnly,
            retry: RetryPolicy::Regenerate,
            timer_scope: TimerScope::Round,
            resume: ResumePolicy::Fresh,
        }
    }

    /// Same profile, different levels
    pub fn with_levels(mut self, levels: Vec<LevelDescriptor>) -> Self {
        self.levels = levels;
        self
    }

    /// Every level must fit this game's match rule
    pub fn check_levels(&self) -> Result<()> {
        match self.levels.iter().find(|l| !self.match_rule.accepts(&l.difficulty)) {
            Some(level) => Err(GameError::InvalidLevelDescriptor(format!(
                "{}: {} difficulty cannot be played as {}",
                level.name,
                level.difficulty.kind(),
                self.kind
            ))),
            None => Ok(()),
        }
    }

    pub fn is_last_level(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }
}

/// The four emotions of the matching game
pub fn default_emotions() -> Vec<Category> {
    vec![
        Category::new("happy", "😊"),
        Category::new("sad", "😢"),
        Category::new("angry", "😠"),
        Category::new("surprised", "😲"),
    ]
}
