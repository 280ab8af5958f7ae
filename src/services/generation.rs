// src/services/generation.rs
use async_trait::async_trait;

use super::session_manager::{ModelBinding, Turn};

/// Raw image sent alongside a prompt.
#[derive(Clone, Debug)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Everything the model needs for one turn.
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    pub binding: &'a ModelBinding,
    pub history: &'a [Turn],
    pub prompt: &'a str,
    pub image: Option<&'a InlineImage>,
}

/// External text/vision model.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest<'_>) -> anyhow::Result<String>;
}
