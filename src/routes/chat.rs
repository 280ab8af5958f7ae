use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    error::{AppError, CHAT_FAILED},
    message::{ChatRequest, ChatResponse},
    state::SharedState,
};

const MISSING_FIELDS: &str = "Se requiere el ID de la sesión y un mensaje.";

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    // Malformed bodies get the same JSON error shape as missing fields.
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "chat body rejected");
        AppError::BadRequest(MISSING_FIELDS.to_string())
    })?;

    let (Some(session_id), Some(message)) = (payload.session_id, payload.message) else {
        return Err(AppError::BadRequest(MISSING_FIELDS.to_string()));
    };

    let reply = state
        .turns
        .handle_chat(&session_id, &message)
        .await
        .map_err(|e| AppError::from_turn(e, CHAT_FAILED))?;

    Ok(Json(ChatResponse { message: reply }))
}
