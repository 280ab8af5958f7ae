// src/services/content_store.rs
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

/// Where an uploaded image ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn store(&self, field_name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<StoredImage>;
}

/// Writes uploads to a local directory served under `/uploads`.
#[derive(Debug, Clone)]
pub struct DiskContentStore {
    dir: PathBuf,
    public_base_url: String,
}

impl DiskContentStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

// `<field>-<millis>-<8 hex>[.ext]`
pub fn generate_filename(field_name: &str, mime_type: &str) -> String {
    let field: String = field_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let field = if field.is_empty() { "file".to_string() } else { field };

    let suffix = Uuid::new_v4().simple().to_string();
    let stem = format!("{field}-{}-{}", Utc::now().timestamp_millis(), &suffix[..8]);
    match extension_for(mime_type) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

#[async_trait]
impl ContentStore for DiskContentStore {
    async fn store(&self, field_name: &str, bytes: &[u8], mime_type: &str) -> anyhow::Result<StoredImage> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = generate_filename(field_name, mime_type);
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::info!(filename = %filename, size = bytes.len(), "stored upload");

        let url = format!(
            "{}/uploads/{}",
            self.public_base_url.trim_end_matches('/'),
            filename
        );
        Ok(StoredImage { filename, url })
    }
}
