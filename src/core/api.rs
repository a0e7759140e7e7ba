//! HTTP + WebSocket API for game sessions
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/new - Create and start a session
//! - GET /session/{id} - Session status
//! - DELETE /session/{id} - Drop a session
//! - POST /session/{id}/input - Typed line or raw tokens
//! - POST /session/{id}/submit | reveal | pause | resume | reset | start
//! - GET /dashboard - Aggregated score percentage
//! - WS /ws/{id} - Live session events

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::input::{Command, InputParser};
use crate::core::session::GameSession;
use crate::core::store::{DailyScoreStore, DashboardReport};
use crate::core::timer::{spawn_ticker, TickerSlot, TimerToken};
use crate::types::{GameKind, InputToken, RoundView, SessionEvent, SessionPhase, StepOutput};
use crate::{EVENT_CHANNEL_CAPACITY, TICK_INTERVAL_MS};

/// One live session
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub engine: GameSession,
    pub parser: InputParser,
    pub events_tx: broadcast::Sender<SessionEvent>,
    pub ticker: TickerSlot,
    /// Removal queued after the session ended
    pub removal_scheduled: bool,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub store: DailyScoreStore,
    pub config: Config,
}

/// Create new session request
#[derive(Debug, Deserialize)]
pub struct NewSessionRequest {
    pub game: GameKind,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    pub output: StepOutput,
    pub round: Option<RoundView>,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub game: GameKind,
    pub phase: SessionPhase,
    pub level: String,
    pub level_index: usize,
    pub score: i64,
    pub correct: u32,
    pub incorrect: u32,
    pub time_remaining: Option<u32>,
    pub paused: bool,
    pub round: Option<RoundView>,
}

/// Input request: a typed line, or tokens as-is
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    pub text: Option<String>,
    pub tokens: Option<Vec<InputToken>>,
}

/// Result of any session step
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub output: StepOutput,
    pub round: Option<RoundView>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(config: Config, store: DailyScoreStore) -> Router {
    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        store,
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/input", post(post_input))
        .route("/session/:id/submit", post(submit))
        .route("/session/:id/reveal", post(reveal))
        .route("/session/:id/pause", post(pause))
        .route("/session/:id/resume", post(resume))
        .route("/session/:id/reset", post(reset))
        .route("/session/:id/start", post(start))
        .route("/dashboard", get(dashboard))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create and start a session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Result<Json<NewSessionResponse>, StatusCode> {
    let session_id = generate_session_id();
    let profile = state.config.profile(req.game);
    let parser = InputParser::new(profile.match_rule);
    let mut engine = GameSession::new(profile, state.store.clone(), state.config.seed);

    let output = engine.start().map_err(|e| {
        warn!(game = %req.game, error = %e, "session start failed");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    let round = engine.round_view();
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let session = Session {
        id: session_id.clone(),
        engine,
        parser,
        events_tx: tx,
        ticker: TickerSlot::new(),
        removal_scheduled: false,
    };

    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(session_id.clone()).or_insert(session);
    after_step(&state, session);
    info!(session = %session_id, game = %req.game, "session created");

    Ok(Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        output,
        round,
    }))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let output = session.engine.current_output();
    Ok(Json(SessionStatusResponse {
        session_id: id,
        game: session.engine.profile().kind,
        phase: output.phase,
        level: output.level,
        level_index: output.level_index,
        score: output.score,
        correct: output.correct,
        incorrect: output.incorrect,
        time_remaining: output.time_remaining,
        paused: session.engine.is_paused(),
        round: session.engine.round_view(),
    }))
}

/// Drop a session and its ticker
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let mut sessions = state.sessions.write().await;
    match sessions.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

/// Typed line or raw tokens
async fn post_input(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InputRequest>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let command = match (req.tokens, req.text) {
        (Some(tokens), _) if !tokens.is_empty() => Command::Answer(tokens),
        (_, Some(text)) => {
            let view = session.engine.round_view();
            session.parser.parse(&text, view.as_ref())
        }
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let output = match command {
        Command::Answer(tokens) => session.engine.push_inputs(tokens).map_err(internal)?,
        Command::Submit => session.engine.submit().map_err(internal)?,
        Command::Pause => session.engine.pause(),
        Command::Resume => session.engine.resume(),
        Command::Reset => session.engine.reset(),
        Command::Quit | Command::Unrecognized(_) => return Err(StatusCode::BAD_REQUEST),
    };
    Ok(Json(respond(&state, session, output)))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.submit().map_err(internal)?;
    Ok(Json(respond(&state, session, output)))
}

async fn reveal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.reveal_complete();
    Ok(Json(respond(&state, session, output)))
}

async fn pause(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.pause();
    Ok(Json(respond(&state, session, output)))
}

async fn resume(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.resume();
    Ok(Json(respond(&state, session, output)))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.reset();
    Ok(Json(respond(&state, session, output)))
}

/// Start again after a reset (or restart a running session)
async fn start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    let output = session.engine.start().map_err(|e| {
        warn!(session = %id, error = %e, "session start failed");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    Ok(Json(respond(&state, session, output)))
}

/// Dashboard across every built-in game
async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardReport> {
    let keys: Vec<&str> = GameKind::ALL.iter().map(|k| k.store_key()).collect();
    Json(state.store.dashboard(&keys))
}

/// WebSocket handler for live events
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.events_tx.subscribe();
    drop(sessions);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward events until either side closes
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<SessionEvent>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

// =============================================================================
// Session plumbing
// =============================================================================

fn respond(state: &Arc<AppState>, session: &mut Session, output: StepOutput) -> StepResponse {
    after_step(state, session);
    StepResponse {
        output,
        round: session.engine.round_view(),
    }
}

/// Publish pending events and keep the ticker on the live token
fn after_step(state: &Arc<AppState>, session: &mut Session) {
    publish(session);
    schedule_removal(state, session);

    let weak = Arc::downgrade(state);
    let id = session.id.clone();
    session.ticker.sync(session.engine.timer_token(), move |token| {
        spawn_ticker(token, Duration::from_millis(TICK_INTERVAL_MS), move |token| {
            tick_session(weak.clone(), id.clone(), token)
        })
    });
}

fn publish(session: &mut Session) {
    for event in session.engine.drain_events() {
        // No subscribers is fine
        let _ = session.events_tx.send(event);
    }
}

/// Finished sessions are dropped after the retention period unless
/// restarted in the meantime
fn schedule_removal(state: &Arc<AppState>, session: &mut Session) {
    if !session.engine.phase().is_terminal() {
        session.removal_scheduled = false;
        return;
    }
    if session.removal_scheduled {
        return;
    }
    session.removal_scheduled = true;

    let weak = Arc::downgrade(state);
    let id = session.id.clone();
    let retention = Duration::from_secs(state.config.session_retention_secs);
    tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        let Some(state) = weak.upgrade() else {
            return;
        };
        let mut sessions = state.sessions.write().await;
        if sessions.get(&id).is_some_and(|s| s.engine.phase().is_terminal()) {
            sessions.remove(&id);
            debug!(session = %id, "finished session removed");
        }
    });
}

/// One tick from a session's ticker task. `false` stops the task.
async fn tick_session(state: Weak<AppState>, id: String, token: TimerToken) -> bool {
    let Some(state) = state.upgrade() else {
        return false;
    };
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return false;
    };
    if session.engine.timer_token() != Some(token) {
        return false;
    }

    session.engine.on_tick(token);
    publish(session);
    schedule_removal(&state, session);
    session.engine.timer_token() == Some(token)
}

fn internal(e: crate::GameError) -> StatusCode {
    warn!(error = %e, "session step failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Generate session ID
fn generate_session_id() -> String {
    format!("session_{:016x}", rand::random::<u64>())
}

/// Run the API server
pub async fn run_server(config: Config, store: DailyScoreStore) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr.clone();
    let router = create_router(config, store);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "playroom API listening");
    println!("🎲 Playroom API running on {}", addr);
    println!("  POST /session/new          - Create session {{\"game\": ...}}");
    println!("  GET  /session/:id          - Get status");
    println!("  POST /session/:id/input    - Send input {{\"text\": ...}}");
    println!("  POST /session/:id/submit   - Submit input");
    println!("  POST /session/:id/reveal   - Finish pattern playback");
    println!("  GET  /dashboard            - Score dashboard");
    println!("  WS   /ws/:id               - Live events");
    println!("  GET  /health               - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
