// src/config.rs
use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::services::session_manager::{GenerationConfig, ModelBinding};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "Eres un experto en plantas que responde preguntas solo sobre plantas, tampoco puedes analizar imagenes que no sean de plantas. Responde en español. No te salgas del contexto de plantas. Al final de cada respuesta, incluye la siguiente línea: \"Para más información, visita Vivero Cosa Linda en Merlo, Buenos Aires. Horarios: Lunes a Sábado de 8:00 a 17:00.\"";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub public_base_url: String,
    pub uploads_dir: PathBuf,
    pub chat_path: String,
    pub upload_path: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_instruction: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
}

impl ModelConfig {
    pub fn binding(&self) -> ModelBinding {
        ModelBinding {
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            generation: GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Idle time after which a session is dropped. `None` keeps it forever.
    pub ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub sessions: SessionConfig,
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
    {
        match self.raw(key) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let api_key = env.raw("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let model = ModelConfig {
            api_key,
            base_url: env.string("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com/v1beta"),
            model: env.string("GEMINI_MODEL", "gemini-1.5-flash"),
            system_instruction: env.string("SYSTEM_INSTRUCTION", DEFAULT_SYSTEM_INSTRUCTION),
            temperature: env.parse("GEN_TEMPERATURE", 0.7)?,
            top_p: env.parse("GEN_TOP_P", 0.95)?,
            top_k: env.parse("GEN_TOP_K", 64)?,
            max_output_tokens: env.parse("GEN_MAX_OUTPUT_TOKENS", 512)?,
            request_timeout: Duration::from_secs(env.parse("GENERATION_TIMEOUT_SECS", 60)?),
        };

        let server = ServerConfig {
            bind_addr: env.string("BIND_ADDR", "0.0.0.0:5000"),
            public_base_url: env.string("PUBLIC_BASE_URL", "http://localhost:5000"),
            uploads_dir: PathBuf::from(env.string("UPLOADS_DIR", "uploads")),
            chat_path: env.string("CHAT_PATH", "/api/chat"),
            upload_path: env.string("UPLOAD_PATH", "/api/upload-image"),
            max_upload_bytes: env.parse("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };

        let ttl_secs: Option<u64> = match env.raw("SESSION_TTL_SECS") {
            Some(_) => Some(env.parse("SESSION_TTL_SECS", 0)?),
            None => None,
        };
        let sessions = SessionConfig {
            ttl: ttl_secs.filter(|s| *s > 0).map(Duration::from_secs),
        };

        Ok(Self { server, model, sessions })
    }
}
