use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::protected::meter_feature;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::{ChatRequest, Feature};
use crate::state::AppState;

/// POST /api/v1/chat - Non-streaming completion proxy
///
/// Forwards the conversation to the configured OpenAI-compatible endpoint
/// and returns the single reply. Missing chat credentials are a 503.
pub async fn chat_post(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<Value> {
    if payload.messages.is_empty() {
        return Err(ApiError::bad_request("messages must not be empty"));
    }
    if !state.chat.is_configured() {
        return Err(ApiError::service_unavailable("Chat is not configured"));
    }
    meter_feature(&state, &current.user, Feature::AiChat).await?;

    let answer = state.chat.complete(&payload.messages).await?;
    Ok(ApiResponse::success(json!({
        "reply": answer.reply,
        "model": answer.model,
    })))
}
