// src/state.rs
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::session_manager::SessionManager;
use crate::services::turn_processor::TurnProcessor;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub turns: TurnProcessor,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(turns: TurnProcessor, server: ServerConfig) -> Self {
        Self { turns, server }
    }

    pub fn sessions(&self) -> &SessionManager {
        self.turns.sessions()
    }
}
