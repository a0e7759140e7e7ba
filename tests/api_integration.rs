//! Integration tests - HTTP API
//!
//! Tests session endpoints and the dashboard against an in-memory store

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use playroom::config::Config;
use playroom::core::{create_router, DailyScoreStore};
use playroom::types::{default_emotions, LevelDescriptor, Operator};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_router() -> Router {
    let config = Config {
        seed: Some(21),
        ..Config::default()
    };
    create_router(config, DailyScoreStore::in_memory())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn new_session(app: &Router, game: &str) -> Value {
    let (status, json) = send(app, "POST", "/session/new", Some(json!({ "game": game }))).await;
    assert_eq!(status, StatusCode::OK);
    json
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions_active"], 0);
}

#[tokio::test]
async fn test_create_session() {
    let app = create_test_router();
    let json = new_session(&app, "arithmetic").await;

    assert!(json["session_id"].is_string());
    assert!(json["websocket_url"].as_str().unwrap().starts_with("/ws/"));
    assert_eq!(json["output"]["phase"], "AWAITING_INPUT");
    assert_eq!(json["output"]["time_remaining"], 60);
    assert!(json["round"]["prompt"].as_str().unwrap().ends_with("= ?"));
}

#[tokio::test]
async fn test_unknown_game_rejected() {
    let app = create_test_router();
    let (status, _) = send(&app, "POST", "/session/new", Some(json!({ "game": "chess" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_levels_rejected_at_start() {
    let mut config = Config::default();
    config.levels.arithmetic = Some(vec![LevelDescriptor::arithmetic("Empty", &[Operator::Add], 10, 0, 60)]);
    let app = create_router(config, DailyScoreStore::in_memory());

    let (status, _) = send(&app, "POST", "/session/new", Some(json!({ "game": "arithmetic" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_session_not_found() {
    let app = create_test_router();
    let (status, _) = send(&app, "GET", "/session/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/session/nonexistent/submit", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_emotion_flow_and_dashboard() {
    let app = create_test_router();
    let created = new_session(&app, "emotion").await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let glyph = created["round"]["items"][0].as_str().unwrap().to_string();
    let label = default_emotions()
        .into_iter()
        .find(|c| c.glyph == glyph)
        .map(|c| c.label)
        .unwrap();

    let tokens = json!({ "tokens": [{ "type": "pair", "item": glyph, "label": label }] });
    let (status, step) = send(&app, "POST", &format!("/session/{}/input", id), Some(tokens)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["output"]["outcome"]["correct"], true);
    assert_eq!(step["output"]["score"], 1);

    let (_, status_json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status_json["game"], "emotion");
    assert_eq!(status_json["correct"], 1);
    assert_eq!(status_json["round"]["items"].as_array().unwrap().len(), 3);

    let (status, dashboard) = send(&app, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["percent"], 100);
}

#[tokio::test]
async fn test_text_input_parsed_per_game() {
    let app = create_test_router();
    let created = new_session(&app, "emotion").await;
    let id = created["session_id"].as_str().unwrap();

    let (status, _) = send(&app, "POST", &format!("/session/{}/input", id), Some(json!({ "text": "hello there friend" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, step) = send(&app, "POST", &format!("/session/{}/input", id), Some(json!({ "text": "1 1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(step["output"]["outcome"].is_object());
}

#[tokio::test]
async fn test_pattern_reveal_then_input() {
    let app = create_test_router();
    let created = new_session(&app, "patterns").await;
    let id = created["session_id"].as_str().unwrap();
    assert_eq!(created["output"]["phase"], "PRESENTING");

    let (_, early) = send(&app, "POST", &format!("/session/{}/input", id), Some(json!({ "text": "piano" }))).await;
    assert_eq!(early["output"]["reason"], "G201_INPUT_IGNORED");

    let (status, revealed) = send(&app, "POST", &format!("/session/{}/reveal", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revealed["output"]["phase"], "AWAITING_INPUT");
    assert!(revealed["round"]["sequence"].is_null());

    let (_, status_json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert!(status_json["round"]["sequence"].is_null(), "sequence still shown while awaiting input");
    assert_eq!(status_json["round"]["expected_len"], 3);

    let sequence: Vec<String> = created["round"]["sequence"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect();
    let (_, step) = send(&app, "POST", &format!("/session/{}/input", id), Some(json!({ "text": sequence.join(" ") }))).await;
    assert_eq!(step["output"]["outcome"]["correct"], true);
    assert_eq!(step["output"]["phase"], "PRESENTING");
}

#[tokio::test]
async fn test_pause_resume_and_reset() {
    let app = create_test_router();
    let created = new_session(&app, "arithmetic").await;
    let id = created["session_id"].as_str().unwrap();

    let (_, paused) = send(&app, "POST", &format!("/session/{}/pause", id), None).await;
    assert_eq!(paused["output"]["reason"], "G410_PAUSED");
    let (_, status_json) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status_json["paused"], true);

    let (_, resumed) = send(&app, "POST", &format!("/session/{}/resume", id), None).await;
    assert_eq!(resumed["output"]["reason"], "G411_RESUMED");

    let (_, reset) = send(&app, "POST", &format!("/session/{}/reset", id), None).await;
    assert_eq!(reset["output"]["phase"], "IDLE");

    let (_, restarted) = send(&app, "POST", &format!("/session/{}/start", id), None).await;
    assert_eq!(restarted["output"]["phase"], "AWAITING_INPUT");

    let (status, _) = send(&app, "DELETE", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_finished_session_removed_after_retention() {
    let config = Config {
        seed: Some(21),
        session_retention_secs: 0,
        ..Config::default()
    };
    let app = create_router(config, DailyScoreStore::in_memory());
    let created = new_session(&app, "emotion").await;
    let id = created["session_id"].as_str().unwrap();

    let mut last = Value::Null;
    for category in default_emotions() {
        let tokens = json!({ "tokens": [{ "type": "pair", "item": category.glyph, "label": category.label }] });
        let (_, step) = send(&app, "POST", &format!("/session/{}/input", id), Some(tokens)).await;
        last = step;
    }
    assert_eq!(last["output"]["phase"], "SESSION_COMPLETE");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_running_session_kept() {
    let config = Config {
        seed: Some(21),
        session_retention_secs: 0,
        ..Config::default()
    };
    let app = create_router(config, DailyScoreStore::in_memory());
    let created = new_session(&app, "emotion").await;
    let id = created["session_id"].as_str().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let (status, _) = send(&app, "GET", &format!("/session/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
}
