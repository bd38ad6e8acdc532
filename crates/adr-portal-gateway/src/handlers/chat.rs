//! Rule-based and AI-assisted chat.

use adr_portal_core::models::{AiChatRequest, ChatMessage, ChatRequest};
use adr_portal_core::{AiReply, ChatReply, Validate};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

const MESSAGE_REQUIRED: &str = "Message is required";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiChatResponse {
    #[serde(flatten)]
    pub reply: AiReply,
    pub conversation_id: String,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = payload
        .map_err(|_| ApiError::BadRequest("Invalid message format".to_string()))
        .and_then(|Json(req)| {
            req.validate()
                .map_err(|_| ApiError::BadRequest("Invalid message format".to_string()))
        })?;
    Ok(Json(state.router.route(&message)))
}

/// GET /api/chat/history
pub async fn chat_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.store.chat_messages())
}

/// POST /api/ai-chat
pub async fn ai_chat(
    State(state): State<AppState>,
    payload: Result<Json<AiChatRequest>, JsonRejection>,
) -> Result<Json<AiChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::BadRequest(MESSAGE_REQUIRED.to_string()))?;
    let (message, history) = req.validate().map_err(|errors| {
        if errors.has_field("message") {
            ApiError::BadRequest(MESSAGE_REQUIRED.to_string())
        } else {
            ApiError::Validation(errors)
        }
    })?;

    let assistant = state.assistant.as_ref().ok_or_else(|| {
        ApiError::Unavailable("AI assistant is not available. Please use the standard chat.".to_string())
    })?;

    let reply = assistant.respond(&message, &history).await;
    if reply.degraded {
        tracing::info!("[chat] ai-chat answered from reference material");
    }
    Ok(Json(AiChatResponse {
        reply,
        conversation_id: uuid::Uuid::new_v4().to_string(),
    }))
}
