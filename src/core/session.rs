//! Session engine: one state machine for every mini-game
//!
//! Phase transitions:
//! - IDLE → PRESENTING: start, first round generated, countdown armed
//! - PRESENTING → AWAITING_INPUT: reveal finished (immediate without reveal)
//! - AWAITING_INPUT → EVALUATING: input complete, or explicit submit
//! - EVALUATING → ADVANCING → PRESENTING: correct, level target not reached
//! - EVALUATING → LEVEL_COMPLETE → PRESENTING: correct, next level
//! - EVALUATING → SESSION_COMPLETE: correct, last level cleared
//! - EVALUATING → AWAITING_INPUT | PRESENTING: incorrect, retry or regenerate
//! - any → TIMED_OUT: countdown expired (checked before every evaluation)
//!
//! The day key is fixed at start. Every score change rewrites today's
//! summary; a failed write is retried on the next change.

use std::time::Instant;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::core::generator::{validate_level, RoundGenerator};
use crate::core::matcher::InputMatcher;
use crate::core::store::{self, day_key, DailyScoreStore};
use crate::core::timer::{Countdown, TimerEvent, TimerToken};
use crate::types::{
    DailySummary, GameProfile, InputToken, LevelDescriptor, Outcome, ResumePolicy, RetryPolicy,
    Round, RoundView, ScoringRule, SessionEvent, SessionOutcome, SessionPhase, StepOutput,
    TimerScope, TransitionReason,
};
use crate::{GameError, Result};

/// Mutable session record, owned by `GameSession` alone
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub level_index: usize,
    pub current_round: Option<Round>,
    pub accumulated_input: Vec<InputToken>,
    pub score: i64,
    pub correct: u32,
    pub incorrect: u32,
    /// Correct answers in the current level
    pub level_correct: u32,
    /// Rounds generated in the current level
    pub rounds_generated: u32,
    /// Items already matched in the current level
    pub solved: Vec<String>,
    pub time_remaining: Option<u32>,
    pub phase: SessionPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            level_index: 0,
            current_round: None,
            accumulated_input: Vec::new(),
            score: 0,
            correct: 0,
            incorrect: 0,
            level_correct: 0,
            rounds_generated: 0,
            solved: Vec::new(),
            time_remaining: None,
            phase: SessionPhase::Idle,
        }
    }
}

/// Generic session engine, specialized by a `GameProfile`
#[derive(Debug)]
pub struct GameSession {
    profile: GameProfile,
    generator: RoundGenerator,
    matcher: InputMatcher,
    countdown: Countdown,
    store: DailyScoreStore,
    state: SessionState,
    /// Fixed at start for the session lifetime
    day: Option<NaiveDate>,
    /// Last summary write failed
    pending_write: bool,
    events: Vec<SessionEvent>,
    last_reason: TransitionReason,
}

impl GameSession {
    /// Create an idle session
    pub fn new(profile: GameProfile, store: DailyScoreStore, seed: Option<u64>) -> Self {
        Self {
            matcher: InputMatcher::new(profile.match_rule),
            profile,
            generator: RoundGenerator::new(seed),
            countdown: Countdown::new(),
            store,
            state: SessionState::new(),
            day: None,
            pending_write: false,
            events: Vec::new(),
            last_reason: TransitionReason::G100_SESSION_IDLE,
        }
    }

    /// Start for today
    pub fn start(&mut self) -> Result<StepOutput> {
        self.start_on(store::today())
    }

    /// Start with an explicit day key. A failed start leaves the session idle.
    pub fn start_on(&mut self, day: NaiveDate) -> Result<StepOutput> {
        if self.state.phase != SessionPhase::Idle {
            self.reset();
        }

        if self.profile.levels.is_empty() {
            return Err(GameError::InvalidLevelDescriptor("profile has no levels".into()));
        }
        for level in &self.profile.levels {
            validate_level(level)?;
        }
        self.profile.check_levels()?;
        let resumed = match self.profile.resume {
            ResumePolicy::Resume => self.resumable_today(day),
            ResumePolicy::Fresh => None,
        };
        let solved = resumed.as_ref().map(|saved| self.resumable_progress(saved)).unwrap_or_default();
        let round = self.generator.generate(&self.profile.levels[0], 1, &solved)?;

        self.day = Some(day);
        if let Some(saved) = resumed {
            debug!(game = %self.profile.kind, score = saved.score, matched = solved.len(), "resuming today's counters");
            self.state.score = saved.score;
            self.state.correct = saved.correct_answers;
            self.state.incorrect = saved.incorrect_answers;
            self.state.level_correct = solved.len() as u32;
            self.state.solved = solved;
        }

        self.state.rounds_generated = 1;
        self.present_round(round, true);

        info!(
            game = %self.profile.kind,
            day = %day_key(day),
            level = %self.level().name,
            "session started"
        );
        Ok(self.output(TransitionReason::G110_ROUND_PRESENTED, None))
    }

    /// Playback finished; input opens
    pub fn reveal_complete(&mut self) -> StepOutput {
        if self.state.phase.is_terminal() {
            return self.output(TransitionReason::G500_SESSION_OVER, None);
        }
        if self.expire_if_overdue() {
            return self.output(TransitionReason::G401_TIMED_OUT, None);
        }
        if self.state.phase != SessionPhase::Presenting {
            return self.output(TransitionReason::G201_INPUT_IGNORED, None);
        }
        self.open_input();
        self.output(TransitionReason::G120_INPUT_OPEN, None)
    }

    /// Add one input token; evaluates once the round's expected length is reached
    pub fn push_input(&mut self, token: InputToken) -> Result<StepOutput> {
        if let Some(out) = self.reject_input() {
            return Ok(out);
        }
        self.state.accumulated_input.push(token);

        let expected = self.state.current_round.as_ref().map(Round::expected_len).unwrap_or(0);
        if self.state.accumulated_input.len() >= expected {
            self.evaluate()
        } else {
            Ok(self.output(TransitionReason::G200_INPUT_ACCEPTED, None))
        }
    }

    /// Push several tokens, stopping at the first evaluation
    pub fn push_inputs(&mut self, tokens: Vec<InputToken>) -> Result<StepOutput> {
        let mut last = self.current_output();
        for token in tokens {
            last = self.push_input(token)?;
            if last.reason != TransitionReason::G200_INPUT_ACCEPTED {
                break;
            }
        }
        Ok(last)
    }

    /// Evaluate whatever has been accumulated
    pub fn submit(&mut self) -> Result<StepOutput> {
        if let Some(out) = self.reject_input() {
            return Ok(out);
        }
        if self.state.accumulated_input.is_empty() {
            return Ok(self.output(TransitionReason::G202_NOTHING_TO_SUBMIT, None));
        }
        self.evaluate()
    }

    /// Deliver one countdown tick
    pub fn on_tick(&mut self, token: TimerToken) -> StepOutput {
        if self.state.phase.is_terminal() {
            return self.output(TransitionReason::G500_SESSION_OVER, None);
        }

        let events = self.countdown.tick(token);
        if events.is_empty() {
            debug!(generation = token.generation(), "stale tick dropped");
            return self.output(TransitionReason::G402_STALE_TICK, None);
        }

        let mut reason = TransitionReason::G400_TICK;
        for event in events {
            match event {
                TimerEvent::Tick { remaining } => {
                    self.events.push(SessionEvent::Tick { remaining });
                }
                TimerEvent::Expired => {
                    self.time_out();
                    reason = TransitionReason::G401_TIMED_OUT;
                }
            }
        }
        self.output(reason, None)
    }

    /// Freeze the countdown
    pub fn pause(&mut self) -> StepOutput {
        if self.countdown.pause() {
            self.output(TransitionReason::G410_PAUSED, None)
        } else {
            self.current_output()
        }
    }

    /// Continue the countdown under a new token
    pub fn resume(&mut self) -> StepOutput {
        if self.countdown.resume().is_some() {
            self.output(TransitionReason::G411_RESUMED, None)
        } else {
            self.current_output()
        }
    }

    /// Back to IDLE. The score store is left untouched.
    pub fn reset(&mut self) -> StepOutput {
        self.countdown.cancel();
        self.state = SessionState::new();
        self.day = None;
        self.pending_write = false;
        self.events.clear();
        debug!(game = %self.profile.kind, "session reset");
        self.output(TransitionReason::G130_SESSION_RESET, None)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Input is only taken while AWAITING_INPUT and before expiry
    fn reject_input(&mut self) -> Option<StepOutput> {
        if self.state.phase.is_terminal() {
            return Some(self.output(TransitionReason::G500_SESSION_OVER, None));
        }
        if self.expire_if_overdue() {
            return Some(self.output(TransitionReason::G401_TIMED_OUT, None));
        }
        if self.state.phase != SessionPhase::AwaitingInput {
            return Some(self.output(TransitionReason::G201_INPUT_IGNORED, None));
        }
        None
    }

    fn evaluate(&mut self) -> Result<StepOutput> {
        self.state.phase = SessionPhase::Evaluating;

        // Expiry wins over an evaluation that has not committed yet
        if self.expire_if_overdue() {
            return Ok(self.output(TransitionReason::G401_TIMED_OUT, None));
        }

        let Some(round) = self.state.current_round.as_ref() else {
            self.state.phase = SessionPhase::AwaitingInput;
            return Ok(self.output(TransitionReason::G201_INPUT_IGNORED, None));
        };
        let input = std::mem::take(&mut self.state.accumulated_input);
        let outcome = self.matcher.evaluate(round, &input);
        debug!(game = %self.profile.kind, correct = outcome.correct, "round evaluated");
        self.events.push(SessionEvent::Feedback { outcome });

        let reason = if outcome.correct {
            self.on_correct(&input)?
        } else {
            self.on_incorrect()?
        };
        Ok(self.output(reason, Some(outcome)))
    }

    fn on_correct(&mut self, input: &[InputToken]) -> Result<TransitionReason> {
        self.state.correct += 1;
        self.state.level_correct += 1;
        self.state.score += 1;
        if let [InputToken::Pair { item, .. }] = input {
            self.state.solved.push(item.clone());
        }

        if self.state.level_correct < self.level().rounds {
            self.state.phase = SessionPhase::Advancing;
            self.next_round(false)?;
            self.persist();
            return Ok(TransitionReason::G300_CORRECT_ADVANCING);
        }

        if self.profile.is_last_level(self.state.level_index) {
            self.state.phase = SessionPhase::SessionComplete;
            self.countdown.cancel();
            self.events.push(SessionEvent::Celebrate);
            info!(game = %self.profile.kind, score = self.state.score, "session complete");
            self.finish(SessionOutcome::Completed);
            return Ok(TransitionReason::G302_SESSION_COMPLETE);
        }

        self.state.phase = SessionPhase::LevelComplete;
        self.state.level_index += 1;
        self.state.level_correct = 0;
        self.state.score = 0;
        self.state.rounds_generated = 0;
        self.state.solved.clear();

        let level = self.level().name.clone();
        info!(game = %self.profile.kind, level = %level, "level advanced");
        self.events.push(SessionEvent::LevelAdvanced {
            level_index: self.state.level_index,
            level,
        });
        self.next_round(true)?;
        self.persist();
        Ok(TransitionReason::G301_LEVEL_COMPLETE)
    }

    fn on_incorrect(&mut self) -> Result<TransitionReason> {
        self.state.incorrect += 1;
        if self.profile.scoring == ScoringRule::PenalizeIncorrect {
            self.state.score -= 1;
        }

        let reason = match self.profile.retry {
            RetryPolicy::Retry => {
                self.state.phase = SessionPhase::AwaitingInput;
                TransitionReason::G310_INCORRECT_RETRY
            }
            RetryPolicy::Regenerate => {
                self.next_round(false)?;
                TransitionReason::G311_INCORRECT_REGENERATED
            }
        };
        self.persist();
        Ok(reason)
    }

    fn next_round(&mut self, new_level: bool) -> Result<()> {
        let number = self.state.rounds_generated + 1;
        let level = &self.profile.levels[self.state.level_index];
        let round = self.generator.generate(level, number, &self.state.solved)?;
        self.state.rounds_generated = number;
        self.present_round(round, new_level);
        Ok(())
    }

    fn present_round(&mut self, round: Round, new_level: bool) {
        let rearm = match self.profile.timer_scope {
            TimerScope::None => false,
            TimerScope::Level => new_level,
            TimerScope::Round => true,
        };
        if rearm {
            let limit = self.level().time_limit_secs;
            match limit {
                Some(secs) => {
                    self.countdown.reset(secs);
                }
                None => self.countdown.cancel(),
            }
        }

        let reveal = round.needs_reveal();
        self.events.push(SessionEvent::RoundPresented { round: round.view() });
        self.state.current_round = Some(round);
        self.state.accumulated_input.clear();
        self.state.phase = SessionPhase::Presenting;

        if !reveal {
            self.open_input();
        }
    }

    fn open_input(&mut self) {
        self.state.phase = SessionPhase::AwaitingInput;
        self.events.push(SessionEvent::InputOpened);
    }

    fn expire_if_overdue(&mut self) -> bool {
        if self.countdown.expire_if_overdue(Instant::now()) {
            self.time_out();
            true
        } else {
            false
        }
    }

    fn time_out(&mut self) {
        self.state.phase = SessionPhase::TimedOut;
        self.state.accumulated_input.clear();
        info!(
            game = %self.profile.kind,
            correct = self.state.correct,
            incorrect = self.state.incorrect,
            "session timed out"
        );
        self.finish(SessionOutcome::TimedOut);
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        let summary = self.summary(true, Some(outcome));
        self.write_summary(&summary);
        self.events.push(SessionEvent::SessionEnded { summary });
    }

    fn persist(&mut self) {
        let summary = self.summary(false, None);
        self.write_summary(&summary);
    }

    /// Storage failures never end the session; the next change retries
    fn write_summary(&mut self, summary: &DailySummary) {
        let Some(day) = self.day else {
            return;
        };
        match self.store.save(&self.profile.store_key, day, summary) {
            Ok(()) => {
                if self.pending_write {
                    info!(game = %self.profile.kind, "pending summary write succeeded");
                }
                self.pending_write = false;
            }
            Err(e) => {
                warn!(game = %self.profile.kind, error = %e, "summary write failed, will retry on next change");
                self.pending_write = true;
            }
        }
    }

    /// Today's summary, if it belongs to an unfinished session
    fn resumable_today(&self, day: NaiveDate) -> Option<DailySummary> {
        match self.store.load_day(&self.profile.store_key, day) {
            Ok(Some(saved)) if !saved.game_over => Some(saved),
            Ok(_) => None,
            Err(e) => {
                warn!(game = %self.profile.kind, error = %e, "could not read today's summary, starting fresh");
                None
            }
        }
    }

    /// Matched items to carry over; only for the first level, and only while
    /// some are left to match
    fn resumable_progress(&self, saved: &DailySummary) -> Vec<String> {
        let first = &self.profile.levels[0];
        if saved.level != first.name || saved.solved.len() >= first.rounds as usize {
            return Vec::new();
        }
        saved.solved.clone()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    fn level(&self) -> &LevelDescriptor {
        &self.profile.levels[self.state.level_index.min(self.profile.levels.len().saturating_sub(1))]
    }

    fn output(&mut self, reason: TransitionReason, outcome: Option<Outcome>) -> StepOutput {
        self.last_reason = reason;
        self.state.time_remaining = self.countdown.remaining();
        StepOutput {
            timestamp: Utc::now(),
            phase: self.state.phase,
            reason,
            level: self.profile.levels.get(self.state.level_index).map(|l| l.name.clone()).unwrap_or_default(),
            level_index: self.state.level_index,
            score: self.state.score,
            correct: self.state.correct,
            incorrect: self.state.incorrect,
            time_remaining: self.state.time_remaining,
            outcome,
        }
    }

    /// Current output without changing anything
    pub fn current_output(&mut self) -> StepOutput {
        let reason = self.last_reason;
        self.output(reason, None)
    }

    /// Summary of the session so far
    pub fn summary(&self, game_over: bool, outcome: Option<SessionOutcome>) -> DailySummary {
        let level = self.profile.levels.get(self.state.level_index);
        DailySummary {
            level: level.map(|l| l.name.clone()).unwrap_or_default(),
            score: self.state.score,
            correct_answers: self.state.correct,
            incorrect_answers: self.state.incorrect,
            total_questions: level.map(|l| l.rounds).unwrap_or(0),
            timestamp: Some(Utc::now()),
            game_over,
            outcome,
            solved: self.state.solved.clone(),
        }
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn timer_token(&self) -> Option<TimerToken> {
        self.countdown.token()
    }

    pub fn is_paused(&self) -> bool {
        self.countdown.is_paused()
    }

    pub fn pending_write(&self) -> bool {
        self.pending_write
    }

    /// What the player may see now. The playback sequence is withheld
    /// once the round is no longer presenting.
    pub fn round_view(&self) -> Option<RoundView> {
        let mut view = self.state.current_round.as_ref().map(Round::view)?;
        if self.state.phase != SessionPhase::Presenting {
            view.sequence = None;
        }
        Some(view)
    }
}

// =============================================================================
// TESTS
// =============================================================================
