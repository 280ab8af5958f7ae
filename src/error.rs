// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::services::turn_processor::TurnError;

pub const CHAT_FAILED: &str = "Error al enviar el mensaje.";
pub const IMAGE_FAILED: &str = "Error al procesar la imagen.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Carries only the public message; details are logged where they occur.
    #[error("internal: {0}")]
    Internal(&'static str),
}

impl AppError {
    /// Map a turn failure, hiding generation and storage details behind `public`.
    pub fn from_turn(err: TurnError, public: &'static str) -> Self {
        match err {
            TurnError::Validation(msg) => AppError::BadRequest(msg),
            TurnError::Generation(_) | TurnError::Storage(_) => AppError::Internal(public),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
