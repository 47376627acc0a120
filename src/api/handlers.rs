//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, MessageRequest, MessageResponse};
use super::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Longest accepted message, in bytes
const MAX_MESSAGE_LEN: usize = 4096;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/conversations/:id/messages", post(post_message))
        .route("/health", get(health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::BadRequest("Conversation id is required".to_string()));
    }
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text is required".to_string()));
    }
    if req.text.len() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Message exceeds {MAX_MESSAGE_LEN} bytes"
        )));
    }

    let reply = state.handler.handle(&id, &req.text).await;
    Ok(Json(MessageResponse { reply }))
}

// ============================================================
// Health
// ============================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_sessions: state.sessions.len().await,
    })
}

async fn get_version() -> &'static str {
    concat!("daylog ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
