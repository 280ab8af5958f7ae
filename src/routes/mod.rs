// src/routes/mod.rs
pub mod chat;
pub mod upload;

use crate::state::SharedState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use chat::chat_handler;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use upload::upload_image_handler;

pub fn create_router(state: SharedState) -> Router {
    let server = &state.server;

    Router::new()
        .route(&server.chat_path, post(chat_handler))
        .route(
            &server.upload_path,
            post(upload_image_handler).layer(DefaultBodyLimit::max(server.max_upload_bytes)),
        )
        .nest_service("/uploads", ServeDir::new(&server.uploads_dir))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
