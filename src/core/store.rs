//! Daily Score Store: one JSON object per game, `YYYY-MM-DD` → summary
//!
//! Key invariant: at most one summary per (game, day). `save` overwrites.
//! Readers skip malformed entries instead of failing.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use crate::types::DailySummary;
use crate::{GameError, Result, DAY_KEY_FORMAT};

/// Calendar-day key, e.g. `2024-03-09`
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Today in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// String key-value backend, one value per store key
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GameError::StorageUnavailable("memory store poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GameError::StorageUnavailable("memory store poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per store key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GameError::StorageUnavailable(format!("{}: {}", path.display(), e))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let storage = |e: std::io::Error| GameError::StorageUnavailable(format!("{}: {}", self.dir.display(), e));

        std::fs::create_dir_all(&self.dir).map_err(storage)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(storage)?;
        std::fs::rename(&tmp, &path).map_err(storage)?;
        Ok(())
    }
}

/// Per-game aggregate for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAggregate {
    pub store_key: String,
    pub entries: usize,
    pub skipped: usize,
    /// Mean score ratio (0.0-1.0)
    pub average: f64,
}

/// What the dashboard tile shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub games: Vec<GameAggregate>,
    /// Mean score ratio across every day entry of every game
    pub average: f64,
    /// `average` as a rounded percentage
    pub percent: u32,
}

/// Typed daily summaries on top of a key-value backend
#[derive(Debug, Clone)]
pub struct DailyScoreStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DailyScoreStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(dir)))
    }

    /// All well-formed day entries of one game
    pub fn load(&self, game_id: &str) -> Result<BTreeMap<String, DailySummary>> {
        let raw = self.read_object(game_id)?;
        let (entries, _) = parse_entries(game_id, &raw);
        Ok(entries)
    }

    /// Summary for one day, if present and well-formed
    pub fn load_day(&self, game_id: &str, day: NaiveDate) -> Result<Option<DailySummary>> {
        Ok(self.load(game_id)?.remove(&day_key(day)))
    }

    /// Store `summary` for `day`, replacing whatever was there. An existing
    /// store that cannot be parsed is left alone and reported as unavailable.
    pub fn save(&self, game_id: &str, day: NaiveDate, summary: &DailySummary) -> Result<()> {
        let mut raw = match self.kv.read(game_id)? {
            Some(content) if !content.trim().is_empty() => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    return Err(GameError::StorageUnavailable(format!(
                        "{}: existing store is not a JSON object, not overwriting",
                        game_id
                    )));
                }
            },
            _ => Map::new(),
        };
        raw.insert(day_key(day), serde_json::to_value(summary)?);
        let json = serde_json::to_string_pretty(&Value::Object(raw))?;
        self.kv.write(game_id, &json)?;
        debug!(game = game_id, day = %day_key(day), score = summary.score, "daily summary saved");
        Ok(())
    }

    /// Mean score ratio over every day entry of the given games, `0.0` if none
    pub fn aggregate(&self, game_ids: &[&str]) -> f64 {
        self.dashboard(game_ids).average
    }

    /// Per-game and overall averages. Missing or unreadable stores count as
    /// empty.
    pub fn dashboard(&self, game_ids: &[&str]) -> DashboardReport {
        let mut games = Vec::with_capacity(game_ids.len());
        let mut ratios = Vec::new();

        for game_id in game_ids {
            let raw = match self.read_object(game_id) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(game = *game_id, error = %e, "store unreadable, treated as empty");
                    Map::new()
                }
            };
            let (entries, skipped) = parse_entries(game_id, &raw);
            let game_ratios: Vec<f64> = entries.values().map(DailySummary::score_ratio).collect();
            games.push(GameAggregate {
                store_key: game_id.to_string(),
                entries: game_ratios.len(),
                skipped,
                average: mean(&game_ratios),
            });
            ratios.extend(game_ratios);
        }

        let average = mean(&ratios);
        DashboardReport {
            games,
            average,
            percent: (average * 100.0).round() as u32,
        }
    }

    /// The store's top-level object; absent store is empty
    fn read_object(&self, game_id: &str) -> Result<Map<String, Value>> {
        let Some(content) = self.kv.read(game_id)? else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(game = game_id, "store is not a JSON object, treated as empty");
                Ok(Map::new())
            }
        }
    }
}

/// Parse day entries, skipping and logging the malformed ones
fn parse_entries(game_id: &str, raw: &Map<String, Value>) -> (BTreeMap<String, DailySummary>, usize) {
    let mut entries = BTreeMap::new();
    let mut skipped = 0;

    for (date, value) in raw {
        match parse_entry(game_id, date, value) {
            Ok(summary) => {
                entries.insert(date.clone(), summary);
            }
            Err(e) => {
                warn!(error = %e, "skipping stored entry");
                skipped += 1;
            }
        }
    }
    (entries, skipped)
}

fn parse_entry(game_id: &str, date: &str, value: &Value) -> Result<DailySummary> {
    let malformed = |reason: String| GameError::MalformedStoredEntry {
        game: game_id.to_string(),
        date: date.to_string(),
        reason,
    };

    NaiveDate::parse_from_str(date, DAY_KEY_FORMAT).map_err(|e| malformed(format!("bad date key: {}", e)))?;

    // Older arithmetic records hold a one-element array per day
    let record = match value {
        Value::Array(items) => items.last().ok_or_else(|| malformed("empty array".into()))?,
        other => other,
    };

    serde_json::from_value(record.clone()).map_err(|e| malformed(e.to_string()))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

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
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_day_key_format() {
        assert_eq!(day_key(day(9)), "2024-03-09");
    }

    #[test]
    fn test_save_overwrites_same_day() {
        let store = DailyScoreStore::in_memory();
        store.save("game", day(1), &summary(1, 1)).unwrap();
        store.save("game", day(1), &summary(4, 0)).unwrap();

        let loaded = store.load("game").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["2024-03-01"], summary(4, 0));
    }

    #[test]
    fn test_save_keeps_unreadable_store_intact() {
        let kv = Arc::new(MemoryStore::new());
        let truncated = r#"{
            "2024-03-01": {"score": 3, "correctAnswers": 3, "incorrectAnswers": 1},
            "2024-03-02": {"score": 1, "correctAnswers": 1, "incorrectAnswers": 0}"#;
        kv.write("game", truncated).unwrap();
        let store = DailyScoreStore::new(kv.clone());

        let result = store.save("game", day(3), &summary(2, 0));
        assert!(matches!(result, Err(GameError::StorageUnavailable(_))));
        assert_eq!(kv.read("game").unwrap().as_deref(), Some(truncated));
    }

    #[test]
    fn test_save_over_empty_content() {
        let kv = Arc::new(MemoryStore::new());
        kv.write("game", "").unwrap();
        let store = DailyScoreStore::new(kv);
        store.save("game", day(1), &summary(1, 0)).unwrap();
        assert_eq!(store.load("game").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let store = DailyScoreStore::in_memory();
        assert!(store.load("nothing").unwrap().is_empty());
        assert_eq!(store.aggregate(&["nothing"]), 0.0);
    }

    #[test]
    fn test_aggregate_skips_malformed() {
        let kv = Arc::new(MemoryStore::new());
        kv.write(
            "game",
            r#"{
                "2024-03-01": {"score": 3, "correctAnswers": 3, "incorrectAnswers": 1},
                "2024-03-02": "garbage",
                "not-a-date": {"score": 1, "correctAnswers": 1, "incorrectAnswers": 0},
                "2024-03-03": [{"score": 1, "correctAnswers": 1, "incorrectAnswers": 1}]
            }"#,
        )
        .unwrap();
        let store = DailyScoreStore::new(kv);

        let report = store.dashboard(&["game"]);
        assert_eq!(report.games[0].entries, 2);
        assert_eq!(report.games[0].skipped, 2);
        assert!((report.average - 0.625).abs() < 1e-9);
        assert_eq!(report.percent, 63);
    }

    #[test]
    fn test_non_object_store_is_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.write("game", "[1, 2, 3]").unwrap();
        let store = DailyScoreStore::new(kv);
        assert_eq!(store.aggregate(&["game"]), 0.0);
    }

    #[test]
    fn test_save_keeps_other_days() {
        let store = DailyScoreStore::in_memory();
        store.save("game", day(1), &summary(1, 0)).unwrap();
        store.save("game", day(2), &summary(2, 0)).unwrap();
        assert_eq!(store.load("game").unwrap().len(), 2);
        assert_eq!(store.load_day("game", day(2)).unwrap(), Some(summary(2, 0)));
    }
}
