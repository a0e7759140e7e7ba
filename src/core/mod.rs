//! Core modules for the session engine

pub mod timer;
pub mod generator;
pub mod matcher;
pub mod store;
pub mod session;
pub mod input;
pub mod api;

pub use timer::{spawn_ticker, Countdown, TickerSlot, TimerEvent, TimerToken};
pub use generator::{generate_round, validate_level, RoundGenerator};
pub use matcher::InputMatcher;
pub use store::{day_key, today, DailyScoreStore, DashboardReport, FileStore, GameAggregate, KeyValueStore, MemoryStore};
pub use session::{GameSession, SessionState};
pub use input::{Command, InputParser};
pub use api::{create_router, run_server};
