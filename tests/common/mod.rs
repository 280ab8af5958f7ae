#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use plant_chatbot::services::{
    content_store::{ContentStore, StoredImage},
    generation::{GenerationBackend, GenerationRequest},
    session_manager::{GenerationConfig, ModelBinding, SessionManager, Turn},
    turn_processor::{TurnConfig, TurnProcessor},
};

/// What the backend saw for one call.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub model: String,
    pub history: Vec<Turn>,
    pub prompt: String,
    pub image_mime: Option<String>,
}

/// Replies from a queue, in order. Runs out into an error.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    seen: Mutex<Vec<SeenRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> anyhow::Result<String> {
        self.seen.lock().unwrap().push(SeenRequest {
            model: request.binding.model.clone(),
            history: request.history.to_vec(),
            prompt: request.prompt.to_string(),
            image_mime: request.image.map(|i| i.mime_type.clone()),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }
}

/// Never answers.
pub struct HangingGenerator;

#[async_trait]
impl GenerationBackend for HangingGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> anyhow::Result<String> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    pub stored: Mutex<Vec<(String, Vec<u8>, String)>>,
    pub fail: bool,
}

impl MemoryContentStore {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(&self, field_name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<StoredImage> {
        if self.fail {
            anyhow::bail!("disk full");
        }
        let mut stored = self.stored.lock().unwrap();
        let filename = format!("{field_name}-{}", stored.len());
        stored.push((filename.clone(), bytes.to_vec(), mime_type.to_string()));
        Ok(StoredImage {
            url: format!("http://localhost:5000/uploads/{filename}"),
            filename,
        })
    }
}

pub fn binding(model: &str) -> ModelBinding {
    ModelBinding {
        model: model.to_string(),
        system_instruction: "Eres un experto en plantas".to_string(),
        generation: GenerationConfig {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 512,
        },
    }
}

pub fn turn_config(timeout: Duration) -> TurnConfig {
    TurnConfig {
        binding: binding("gemini-1.5-flash"),
        request_timeout: timeout,
    }
}

pub fn processor(
    generator: Arc<dyn GenerationBackend>,
    store: Arc<dyn ContentStore>,
) -> TurnProcessor {
    TurnProcessor::new(
        SessionManager::new(None),
        generator,
        store,
        turn_config(Duration::from_secs(5)),
    )
}
