//! Integration tests - Countdown and ticker tasks
//!
//! Token discipline: only the live generation may tick or expire.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use playroom::core::{spawn_ticker, Countdown, TickerSlot, TimerEvent};
use tokio::sync::Mutex;

#[test]
fn test_countdown_of_n_emits_n_ticks_and_one_expiry() {
    for n in [1u32, 5, 30] {
        let mut countdown = Countdown::new();
        let token = countdown.start(n);
        let events: Vec<TimerEvent> = (0..n + 5).flat_map(|_| countdown.tick(token)).collect();

        let ticks = events.iter().filter(|e| matches!(e, TimerEvent::Tick { .. })).count();
        let expiries = events.iter().filter(|e| **e == TimerEvent::Expired).count();
        assert_eq!(ticks, n as usize, "ticks for start({})", n);
        assert_eq!(expiries, 1, "expiries for start({})", n);
    }
}

#[test]
fn test_cancel_before_expiry_means_no_expiry() {
    let mut countdown = Countdown::new();
    let token = countdown.start(3);
    countdown.tick(token);
    countdown.cancel();

    let late: Vec<_> = (0..5).flat_map(|_| countdown.tick(token)).collect();
    assert!(late.is_empty());
    assert!(!countdown.is_expired());
}

#[test]
fn test_old_generation_cannot_touch_new_countdown() {
    let mut countdown = Countdown::new();
    let old = countdown.start(1);
    let new = countdown.reset(5);

    assert!(countdown.tick(old).is_empty());
    assert_eq!(countdown.remaining(), Some(5));
    assert_eq!(countdown.tick(new), vec![TimerEvent::Tick { remaining: 4 }]);
}

#[test]
fn test_deadline_passes_without_tick() {
    let mut countdown = Countdown::new();
    countdown.start(1);
    assert!(!countdown.expire_if_overdue(Instant::now()));
    assert!(countdown.expire_if_overdue(Instant::now() + Duration::from_secs(2)));
    assert!(countdown.is_expired());
    assert_eq!(countdown.remaining(), Some(0));
}

#[tokio::test]
async fn test_ticker_drives_countdown_to_expiry() {
    let countdown = Arc::new(Mutex::new(Countdown::new()));
    let expiries = Arc::new(AtomicU32::new(0));
    let token = countdown.lock().await.start(3);

    let shared = countdown.clone();
    let seen = expiries.clone();
    let handle = spawn_ticker(token, Duration::from_millis(5), move |token| {
        let shared = shared.clone();
        let seen = seen.clone();
        async move {
            let mut countdown = shared.lock().await;
            for event in countdown.tick(token) {
                if event == TimerEvent::Expired {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }
            countdown.token() == Some(token)
        }
    });

    handle.await.unwrap();
    assert_eq!(expiries.load(Ordering::SeqCst), 1);
    assert!(countdown.lock().await.is_expired());
}

#[tokio::test]
async fn test_slot_keeps_one_task_per_token() {
    let mut countdown = Countdown::new();
    let mut slot = TickerSlot::new();
    let spawned = Arc::new(AtomicU32::new(0));

    let token = countdown.start(10);
    for _ in 0..3 {
        let spawned = spawned.clone();
        slot.sync(Some(token), move |t| {
            spawned.fetch_add(1, Ordering::SeqCst);
            spawn_ticker(t, Duration::from_secs(60), |_| async { true })
        });
    }
    assert_eq!(spawned.load(Ordering::SeqCst), 1);

    slot.cancel();
    assert_eq!(slot.armed_token(), None);
}
