// src/services/turn_processor.rs
use std::{sync::Arc, time::Duration};

use super::content_store::ContentStore;
use super::generation::{GenerationBackend, GenerationRequest, InlineImage};
use super::response_filter::{MarkerFilter, ResponseFilter};
use super::session_manager::{ModelBinding, Session, SessionManager};

pub const IMAGE_PROMPT: &str = "¿Puedes analizar esta imagen y decirme qué tipo de planta es?";
pub const IMAGE_TURN_TEXT: &str = "Imagen subida";

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),
    #[error("storage failed: {0:#}")]
    Storage(anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Binding given to sessions created by this processor.
    pub binding: ModelBinding,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub field_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReply {
    pub message: String,
    pub image_url: String,
}

pub struct TurnProcessor {
    sessions: SessionManager,
    generator: Arc<dyn GenerationBackend>,
    store: Arc<dyn ContentStore>,
    filters: Vec<Arc<dyn ResponseFilter>>,
    config: TurnConfig,
}

impl TurnProcessor {
    pub fn new(
        sessions: SessionManager,
        generator: Arc<dyn GenerationBackend>,
        store: Arc<dyn ContentStore>,
        config: TurnConfig,
    ) -> Self {
        Self {
            sessions,
            generator,
            store,
            filters: vec![Arc::new(MarkerFilter::plants())],
            config,
        }
    }

    /// Replace the filter chain run over image replies.
    pub fn with_filters(mut self, filters: Vec<Arc<dyn ResponseFilter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    async fn resolve(&self, session_id: &str) -> Arc<Session> {
        self.sessions.get_or_create(session_id, &self.config.binding).await
    }

    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, TurnError> {
        match tokio::time::timeout(self.config.request_timeout, self.generator.generate(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(TurnError::Generation(e)),
            Err(_) => Err(TurnError::Generation(anyhow::anyhow!(
                "no reply within {:?}",
                self.config.request_timeout
            ))),
        }
    }

    fn filter(&self, session_id: &str, reply: String) -> String {
        self.filters.iter().fold(reply, |reply, f| {
            let out = f.apply(reply.clone());
            if out != reply {
                tracing::info!(session_id = %session_id, filter = f.name(), "reply replaced by filter");
            }
            out
        })
    }

    pub async fn handle_chat(&self, session_id: &str, message: &str) -> Result<String, TurnError> {
        if session_id.is_empty() {
            return Err(TurnError::Validation("sessionId is required".to_string()));
        }
        if message.is_empty() {
            return Err(TurnError::Validation("message is required".to_string()));
        }

        let session = self.resolve(session_id).await;
        let mut conversation = session.lock().await;

        let request = GenerationRequest {
            binding: session.binding(),
            history: conversation.history(),
            prompt: message,
            image: None,
        };
        let reply = self.generate(request).await.inspect_err(|e| {
            tracing::error!(session_id = %session_id, operation = "chat", error = %e, "turn failed");
        })?;

        let history_len = conversation.record_exchange(message, reply.as_str());
        tracing::info!(session_id = %session_id, operation = "chat", history_len, "turn completed");
        Ok(reply)
    }

    pub async fn handle_image(&self, session_id: &str, upload: ImageUpload) -> Result<ImageReply, TurnError> {
        if session_id.is_empty() {
            return Err(TurnError::Validation("sessionId is required".to_string()));
        }
        if upload.bytes.is_empty() {
            return Err(TurnError::Validation("image is required".to_string()));
        }
        if !upload.mime_type.starts_with("image/") {
            return Err(TurnError::Validation(format!(
                "unsupported file type: {}",
                upload.mime_type
            )));
        }

        let session = self.resolve(session_id).await;
        let mut conversation = session.lock().await;

        let stored = self
            .store
            .store(&upload.field_name, &upload.bytes, &upload.mime_type)
            .await
            .map_err(TurnError::Storage)
            .inspect_err(|e| {
                tracing::error!(session_id = %session_id, operation = "image", error = %e, "turn failed");
            })?;

        let image = InlineImage { mime_type: upload.mime_type, data: upload.bytes };
        let request = GenerationRequest {
            binding: session.binding(),
            history: &[],
            prompt: IMAGE_PROMPT,
            image: Some(&image),
        };
        let reply = self.generate(request).await.inspect_err(|e| {
            tracing::error!(session_id = %session_id, operation = "image", error = %e, "turn failed");
        })?;

        let message = self.filter(session_id, reply);
        let history_len = conversation.record_exchange(IMAGE_TURN_TEXT, message.as_str());
        tracing::info!(
            session_id = %session_id,
            operation = "image",
            history_len,
            filename = %stored.filename,
            "turn completed"
        );

        Ok(ImageReply { message, image_url: stored.url })
    }
}
