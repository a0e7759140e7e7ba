//! Countdown: 1-second resolution timer with generation tokens
//!
//! Every `start`/`reset`/`resume` arms a new generation. Ticks carry the
//! token they were armed with; a tick whose token is not the live one is
//! dropped, so a superseded timer can never expire the new one.
//!
//! - start(n) → n × Tick, then exactly one Expired
//! - cancel() → idempotent, invalidates pending ticks
//! - reset(n) → cancel + start(n)

use std::future::Future;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one armed countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Produced by a live tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u32 },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Stopped,
    Running,
    Paused,
    Expired,
}

/// Countdown state
#[derive(Debug)]
pub struct Countdown {
    generation: u64,
    remaining: u32,
    state: TimerState,
    /// Wall-clock instant the countdown runs out
    deadline: Option<Instant>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    /// Create a stopped countdown
    pub fn new() -> Self {
        Self {
            generation: 0,
            remaining: 0,
            state: TimerState::Stopped,
            deadline: None,
        }
    }

    /// Arm for `duration_secs`
    pub fn start(&mut self, duration_secs: u32) -> TimerToken {
        self.generation += 1;
        self.remaining = duration_secs;
        self.state = TimerState::Running;
        self.deadline = Some(Instant::now() + Duration::from_secs(duration_secs as u64));
        debug!(generation = self.generation, duration_secs, "countdown started");
        TimerToken(self.generation)
    }

    /// Stop all future ticks. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if self.state == TimerState::Running || self.state == TimerState::Paused {
            debug!(generation = self.generation, "countdown cancelled");
        }
        self.generation += 1;
        self.state = TimerState::Stopped;
        self.deadline = None;
    }

    /// Cancel, then start again
    pub fn reset(&mut self, duration_secs: u32) -> TimerToken {
        self.cancel();
        self.start(duration_secs)
    }

    /// Freeze remaining time; pending ticks become stale
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.generation += 1;
        self.state = TimerState::Paused;
        self.deadline = None;
        true
    }

    /// Continue a paused countdown under a new token
    pub fn resume(&mut self) -> Option<TimerToken> {
        if self.state != TimerState::Paused {
            return None;
        }
        let remaining = self.remaining;
        Some(self.start(remaining))
    }

    /// Advance one second. Returns nothing for a stale token.
    pub fn tick(&mut self, token: TimerToken) -> Vec<TimerEvent> {
        if token.0 != self.generation || self.state != TimerState::Running {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if self.remaining > 0 {
            self.remaining -= 1;
            events.push(TimerEvent::Tick { remaining: self.remaining });
        }
        if self.remaining == 0 {
            self.expire();
            events.push(TimerEvent::Expired);
        }
        events
    }

    /// Expire now if the wall-clock deadline has passed but the final tick
    /// has not been delivered yet
    pub fn expire_if_overdue(&mut self, now: Instant) -> bool {
        match (self.state, self.deadline) {
            (TimerState::Running, Some(deadline)) if now >= deadline => {
                self.remaining = 0;
                self.expire();
                true
            }
            _ => false,
        }
    }

    fn expire(&mut self) {
        self.generation += 1;
        self.state = TimerState::Expired;
        self.deadline = None;
        debug!("countdown expired");
    }

    /// Token of the running countdown
    pub fn token(&self) -> Option<TimerToken> {
        match self.state {
            TimerState::Running => Some(TimerToken(self.generation)),
            _ => None,
        }
    }

    /// Seconds left while running or paused
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            TimerState::Running | TimerState::Paused => Some(self.remaining),
            TimerState::Expired => Some(0),
            TimerState::Stopped => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn is_expired(&self) -> bool {
        self.state == TimerState::Expired
    }
}

/// Drive `on_tick` every `period` until it returns `false`
pub fn spawn_ticker<F, Fut>(token: TimerToken, period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut(TimerToken) -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            if !on_tick(token).await {
                break;
            }
        }
    })
}

/// Holds at most one ticker task; replacing the token aborts the old task
/// before the new one is spawned
#[derive(Debug, Default)]
pub struct TickerSlot {
    armed: Option<(TimerToken, JoinHandle<()>)>,
}

impl TickerSlot {
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Make the running task match `token`. `spawn` is only called when a
    /// new task is needed.
    pub fn sync<S>(&mut self, token: Option<TimerToken>, spawn: S)
    where
        S: FnOnce(TimerToken) -> JoinHandle<()>,
    {
        let current = self.armed.as_ref().map(|(t, _)| *t);
        if current == token {
            return;
        }
        self.cancel();
        if let Some(token) = token {
            self.armed = Some((token, spawn(token)));
        }
    }

    pub fn cancel(&mut self) {
        if let Some((_, handle)) = self.armed.take() {
            handle.abort();
        }
    }

    pub fn armed_token(&self) -> Option<TimerToken> {
        self.armed.as_ref().map(|(t, _)| *t)
    }
}

impl Drop for TickerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// TESTS
// =============================================================================
