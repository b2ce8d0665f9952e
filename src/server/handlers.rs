use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use super::AppState;

/// Inbound `/chat` body. Both fields are optional at the wire level so that
/// a missing field is reported as a validation error rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::Unprocessable(e.body_text()))?;

    let message = request.message.unwrap_or_default();
    let collection = request.collection.unwrap_or_default();

    let response = state
        .handler
        .handle(&message, &collection)
        .await
        .map_err(|e| ApiError::from_rag(e, state.validation_status))?;

    Ok(Json(ChatResponse { response }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
