//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::generation::{GenerationBackend, GenerationRequest};
use super::session_manager::Turn;

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: Blob },
}

#[derive(Debug, Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model_name = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!(
            "{}/{model_name}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }
}

fn history_content(turn: &Turn) -> Content {
    Content {
        role: Some(turn.role.as_str()),
        parts: vec![Part::Text { text: turn.text.clone() }],
    }
}

fn build_request(request: &GenerationRequest<'_>) -> GenerateContentRequest {
    let mut contents: Vec<Content> = request.history.iter().map(history_content).collect();

    let mut parts = vec![Part::Text { text: request.prompt.to_string() }];
    if let Some(image) = request.image {
        parts.push(Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data),
            },
        });
    }
    contents.push(Content { role: Some("user"), parts });

    let binding = request.binding;
    let system_instruction = (!binding.system_instruction.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part::Text { text: binding.system_instruction.clone() }],
    });

    GenerateContentRequest {
        contents,
        system_instruction,
        generation_config: WireGenerationConfig {
            temperature: binding.generation.temperature,
            top_p: binding.generation.top_p,
            top_k: binding.generation.top_k,
            max_output_tokens: binding.generation.max_output_tokens,
            response_mime_type: "text/plain",
        },
    }
}

fn extract_text(response: GenerateContentResponse) -> anyhow::Result<String> {
    if let Some(err) = response.error {
        anyhow::bail!("Gemini API error: {}", err.message);
    }

    let text: String = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        anyhow::bail!("No response from Gemini");
    }
    Ok(text)
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> anyhow::Result<String> {
        let url = self.endpoint(&request.binding.model);
        let body = build_request(&request);

        tracing::debug!(
            model = %request.binding.model,
            history_len = request.history.len(),
            has_image = request.image.is_some(),
            "calling Gemini"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let result: GenerateContentResponse = response.json().await?;
        extract_text(result)
    }
}
