//! HTTP handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use parley_core::{ChatRequest, ChatResponse};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ApiError;
use crate::server::GatewayState;

/// `POST /api/chat`
pub async fn chat(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    debug!(
        "Chat request: provider={}, history={}",
        request.provider,
        request.history().len()
    );
    let response = state.relay.route(&request).await?;
    Ok(Json(response))
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Multi-AI Chatbot API is running" }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
