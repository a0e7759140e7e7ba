//! Integration tests - File-backed daily score store and dashboard

use std::fs;
use chrono::NaiveDate;
use playroom::core::{DailyScoreStore, GameSession};
use playroom::types::{DailySummary, GameKind, GameProfile, InputToken};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn summary(correct: u32, incorrect: u32) -> DailySummary {
    DailySummary {
        level: "Level 1".to_string(),
        score: correct as i64,
        correct_answers: correct,
        incorrect_answers: incorrect,
        total_questions: 5,
        timestamp: None,
        game_over: true,
        outcome: None,
        solved: Vec::new(),
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn all_keys() -> Vec<&'static str> {
    GameKind::ALL.iter().map(|k| k.store_key()).collect()
}

#[test]
fn test_file_store_roundtrip_keeps_one_entry_per_day() {
    let dir = TempDir::new().unwrap();
    let store = DailyScoreStore::on_disk(dir.path());

    store.save("arithmeticGameScores", day(1), &summary(2, 3)).unwrap();
    store.save("arithmeticGameScores", day(1), &summary(5, 0)).unwrap();
    store.save("arithmeticGameScores", day(2), &summary(1, 1)).unwrap();

    let reopened = DailyScoreStore::on_disk(dir.path());
    let entries = reopened.load("arithmeticGameScores").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries["2024-07-01"], summary(5, 0));
    assert!(dir.path().join("arithmeticGameScores.json").exists());
}

#[test]
fn test_dashboard_with_no_stores_is_zero() {
    let dir = TempDir::new().unwrap();
    let store = DailyScoreStore::on_disk(dir.path().join("missing"));
    let report = store.dashboard(&all_keys());
    assert_eq!(report.percent, 0);
    assert_eq!(report.average, 0.0);
    assert!(report.games.iter().all(|g| g.entries == 0));
}

#[test]
fn test_dashboard_averages_across_games() {
    let dir = TempDir::new().unwrap();
    let store = DailyScoreStore::on_disk(dir.path());
    store.save(GameKind::Arithmetic.store_key(), day(1), &summary(3, 1)).unwrap();
    store.save(GameKind::Emotion.store_key(), day(1), &summary(1, 1)).unwrap();
    store.save(GameKind::Patterns.store_key(), day(2), &summary(0, 0)).unwrap();

    let report = store.dashboard(&all_keys());
    // (0.75 + 0.5 + 0.0) / 3
    assert!((report.average - 0.4166666).abs() < 1e-6);
    assert_eq!(report.percent, 42);
    assert_eq!(store.aggregate(&all_keys()), report.average);
}

#[test]
fn test_dashboard_reads_legacy_and_skips_corrupt_entries() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("arithmeticGameScores.json"),
        r#"{"2024-07-01": [{"level": "Level 2", "score": 4, "correctAnswers": 4, "incorrectAnswers": 0, "totalQuestions": 7}],
            "2024-07-02": {"score": "lots"}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("MusicalPatternsGame.json"),
        r#"{"2024-07-01": {"score": 1, "totalCorrect": 1, "totalIncorrect": 1}}"#,
    )
    .unwrap();
    fs::write(dir.path().join("emotionGameScores.json"), "not json at all").unwrap();

    let store = DailyScoreStore::on_disk(dir.path());
    let report = store.dashboard(&all_keys());

    assert_eq!(report.games[0].entries, 1);
    assert_eq!(report.games[0].skipped, 1);
    assert_eq!(report.games[1].entries, 0);
    assert_eq!(report.games[2].entries, 1);
    assert_eq!(report.percent, 75);
}

#[test]
fn test_unwritable_store_does_not_stop_play() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocked");
    fs::write(&blocker, "a file where the store directory should be").unwrap();

    let store = DailyScoreStore::on_disk(&blocker);
    let mut session = GameSession::new(GameProfile::emotion(), store, Some(1));
    session.start_on(day(3)).unwrap();

    let out = session.push_input(InputToken::pair("😊", "happy")).unwrap();
    assert_eq!(out.score, 1);
    assert!(session.pending_write());
}

#[test]
fn test_failed_write_retried_once_store_recovers() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("scores");
    fs::write(&blocker, "a file where the store directory should be").unwrap();

    let store = DailyScoreStore::on_disk(&blocker);
    let mut session = GameSession::new(GameProfile::emotion(), store.clone(), Some(1));
    session.start_on(day(4)).unwrap();
    session.push_input(InputToken::pair("😊", "happy")).unwrap();
    assert!(session.pending_write());

    fs::remove_file(&blocker).unwrap();
    let out = session.push_input(InputToken::pair("😢", "angry")).unwrap();
    assert_eq!(out.incorrect, 1);
    assert!(!session.pending_write());

    let saved = store.load_day(GameKind::Emotion.store_key(), day(4)).unwrap().unwrap();
    assert_eq!(saved.correct_answers, 1);
    assert_eq!(saved.incorrect_answers, 1);
    assert_eq!(saved.score, 0);
    assert_eq!(saved.solved, vec!["😊".to_string()]);
}

#[test]
fn test_corrupt_store_file_survives_a_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emotionGameScores.json");
    let truncated = r#"{"2024-07-01": {"score": 2, "correctAnswers": 2, "incorrectAnswers": 0},
        "2024-07-02": {"score": 1, "correctAnswers": 1, "incorrectAnswers": 1}"#;
    fs::write(&path, truncated).unwrap();

    let store = DailyScoreStore::on_disk(dir.path());
    let mut session = GameSession::new(GameProfile::emotion(), store, Some(1));
    session.start_on(day(5)).unwrap();
    let out = session.push_input(InputToken::pair("😊", "happy")).unwrap();

    assert_eq!(out.score, 1);
    assert!(session.pending_write());
    assert_eq!(fs::read_to_string(&path).unwrap(), truncated);
}
