use std::{sync::Arc, time::Duration};

use plant_chatbot::{
    config::AppConfig,
    routes,
    services::{
        content_store::DiskContentStore,
        gemini::GeminiClient,
        session_manager::SessionManager,
        turn_processor::{TurnConfig, TurnProcessor},
    },
    state::AppState,
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    tokio::fs::create_dir_all(&config.server.uploads_dir).await?;

    let generator = GeminiClient::new(
        config.model.api_key.clone(),
        config.model.base_url.clone(),
        config.model.request_timeout,
    )?;
    let store = DiskContentStore::new(
        config.server.uploads_dir.clone(),
        config.server.public_base_url.clone(),
    );
    let sessions = SessionManager::new(config.sessions.ttl);

    if let Some(ttl) = sessions.ttl() {
        sessions.spawn_reaper((ttl / 2).max(Duration::from_secs(1)));
    }

    let turns = TurnProcessor::new(
        sessions,
        Arc::new(generator),
        Arc::new(store),
        TurnConfig {
            binding: config.model.binding(),
            request_timeout: config.model.request_timeout,
        },
    );
    let state = Arc::new(AppState::new(turns, config.server.clone()));

    let app = routes::create_router(state).layer(CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(
        addr = %config.server.bind_addr,
        model = %config.model.model,
        "plant chatbot listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
