//! HTTP request handlers

use super::types::{InitializeRequest, OperationResponse, SendMessageRequest, ThreadQuery};
use super::AppState;
use crate::assistant::ApiError;
use crate::session::Session;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/initialize", post(initialize_chat))
        .route("/api/chat/messages", post(start_message))
        .route("/api/chat/runs/:run_id", get(poll_run_status))
        .route("/api/chat/history", get(get_chat_history))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Conversation operations
// ============================================================

async fn initialize_chat(
    State(state): State<AppState>,
    Json(req): Json<InitializeRequest>,
) -> Json<OperationResponse> {
    let mut session = Session::from_thread_id(req.thread_id);
    let result = state.ops.initialize(&mut session).await;
    Json(respond("initialize", result, OperationResponse::initialized))
}

async fn start_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Json<OperationResponse> {
    let session = Session::from_thread_id(req.thread_id);
    let result = state.ops.send_message(&req.text, &session).await;
    Json(respond("send message", result, OperationResponse::started))
}

async fn poll_run_status(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> Json<OperationResponse> {
    let session = Session::from_thread_id(query.thread_id);
    let result = state.ops.poll_status(&run_id, &session).await;
    Json(respond("poll status", result, OperationResponse::outcome))
}

async fn get_chat_history(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Json<OperationResponse> {
    let session = Session::from_thread_id(query.thread_id);
    let result = state.ops.fetch_history(&session).await;
    Json(respond("fetch history", result, OperationResponse::history))
}

async fn get_version() -> &'static str {
    concat!("assistant-relay ", env!("CARGO_PKG_VERSION"))
}

fn respond<T>(
    operation: &str,
    result: Result<T, ApiError>,
    ok: impl FnOnce(T) -> OperationResponse,
) -> OperationResponse {
    match result {
        Ok(value) => ok(value),
        Err(e) => {
            tracing::warn!(operation, kind = ?e.kind, error = %e, "Operation failed");
            OperationResponse::failure(&e)
        }
    }
}
