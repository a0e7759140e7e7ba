//! Events emitted to the rendering layer

use serde::{Deserialize, Serialize};
use crate::types::{DailySummary, Outcome, RoundView};

/// Session-to-UI events. The engine emits them; it never renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    RoundPresented { round: RoundView },
    /// Reveal finished, the player may answer
    InputOpened,
    Feedback { outcome: Outcome },
    LevelAdvanced { level_index: usize, level: String },
    Tick { remaining: u32 },
    /// Last level cleared
    Celebrate,
    SessionEnded { summary: DailySummary },
}
