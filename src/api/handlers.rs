//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, ResetResponse, SessionListResponse, SessionResponse,
    SessionWithMessagesResponse, SuggestionsResponse,
};
use super::AppState;
use crate::runtime::{Command, SessionError, SessionSnapshot, SseEvent};
use crate::state_machine::{RESET_DESCRIPTION, RESET_TITLE};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Local, Timelike};
use rand::seq::SliceRandom;

/// Prompts offered on an empty conversation
pub const SUGGESTIONS: [&str; 3] = [
    "Quelle est la situation de l'inflation dans l'UEMOA ?",
    "Montrez-moi le dernier rapport trimestriel",
    "Analysez les tendances de croissance économique",
];

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session history
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/new", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/by-slug/:slug", get(get_by_slug))
        // Live updates
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/new-conversation", post(new_conversation))
        .route("/api/suggestions", get(list_suggestions))
        // Version
        .route("/version", get(get_version))
        .fallback(not_found)
        .with_state(state)
}

// ============================================================
// Session History
// ============================================================

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.sessions.list().await,
    })
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.sessions.create(&generate_slug()).await;
    Json(SessionResponse { session })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionWithMessagesResponse>, AppError> {
    let snapshot = state.sessions.snapshot(&id).await?;
    Ok(Json(with_messages(snapshot)))
}

async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SessionWithMessagesResponse>, AppError> {
    let snapshot = state.sessions.snapshot_by_slug(&slug).await?;
    Ok(Json(with_messages(snapshot)))
}

fn with_messages(snapshot: SessionSnapshot) -> SessionWithMessagesResponse {
    let awaiting_reply = snapshot.awaiting_reply();
    SessionWithMessagesResponse {
        session: snapshot.session,
        messages: snapshot.messages,
        awaiting_reply,
    }
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, broadcast_rx) = state.sessions.subscribe(&id).await?;

    let awaiting_reply = snapshot.awaiting_reply();
    let init_event = SseEvent::Init {
        session: snapshot.session,
        messages: snapshot.messages,
        awaiting_reply,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    // Still 404 for an unknown session even when the text is blank
    state.sessions.snapshot(&id).await?;

    if req.text.trim().is_empty() {
        return Ok(Json(ChatResponse { queued: false }));
    }

    state
        .sessions
        .send(&id, Command::Submit { text: req.text })
        .await?;

    Ok(Json(ChatResponse { queued: true }))
}

async fn new_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, AppError> {
    state.sessions.send(&id, Command::NewConversation).await?;

    Ok(Json(ResetResponse {
        title: RESET_TITLE.to_string(),
        description: RESET_DESCRIPTION.to_string(),
    }))
}

async fn list_suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: SUGGESTIONS.to_vec(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("bceao-assistant ", env!("CARGO_PKG_VERSION"))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

// ============================================================
// Slug Generation
// ============================================================

fn generate_slug() -> String {
    let now = Local::now();

    let day = match now.weekday() {
        chrono::Weekday::Mon => "lundi",
        chrono::Weekday::Tue => "mardi",
        chrono::Weekday::Wed => "mercredi",
        chrono::Weekday::Thu => "jeudi",
        chrono::Weekday::Fri => "vendredi",
        chrono::Weekday::Sat => "samedi",
        chrono::Weekday::Sun => "dimanche",
    };

    let time = match now.hour() {
        6..=11 => "matin",
        12..=17 => "apres-midi",
        18..=21 => "soir",
        _ => "nuit",
    };

    let words = &[
        "baobab", "fleuve", "savane", "sahel", "delta", "lagune", "harmattan", "mousson", "coton",
        "cacao", "arachide", "karite", "cauri", "franc", "taux", "indice", "budget", "epargne",
        "credit", "reserve", "change", "marche", "bilan", "croissance",
    ];

    let mut rng = rand::thread_rng();
    let first = words.choose(&mut rng).unwrap_or(&"baobab");
    let second = words.choose(&mut rng).unwrap_or(&"sahel");

    format!("{day}-{time}-{first}-{second}")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Closed(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
