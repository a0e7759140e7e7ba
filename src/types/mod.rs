//! Core types for the session engine

mod phase;
mod reason;
mod output;
mod level;
mod round;
mod summary;
mod event;
mod profile;

pub use phase::SessionPhase;
pub use reason::TransitionReason;
pub use output::StepOutput;
pub use level::{Category, Difficulty, Expression, LevelDescriptor, Operator};
pub use round::{Challenge, InputToken, Outcome, Round, RoundView};
pub use summary::{DailySummary, SessionOutcome};
pub use event::SessionEvent;
pub use profile::{
    default_emotions, GameKind, GameProfile, MatchRule, ResumePolicy, RetryPolicy, ScoringRule,
    TimerScope,
};
