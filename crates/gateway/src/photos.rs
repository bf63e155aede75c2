//! Team photos in the hosted object storage.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::error::{GatewayError, Result};

const PHOTO_PREFIX: &str = "team-photos";

#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Stores `bytes` at `path`, replacing any previous object, and returns its public URL.
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

/// File extension for the image types teams may upload.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// `team-photos/<team id>.<ext>`; one object per team, overwritten on every upload.
pub fn photo_path(team_id: Uuid, extension: &str) -> String {
    format!("{PHOTO_PREFIX}/{team_id}.{extension}")
}

#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    pub project_url: Url,
    pub service_key: String,
    pub bucket: String,
}

pub struct SupabaseStorageClient {
    client: Client,
    config: SupabaseStorageConfig,
}

impl SupabaseStorageClient {
    pub fn new(config: SupabaseStorageConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self { client, config })
    }

    pub fn public_url(&self, path: &str) -> Result<String> {
        let url = self.config.project_url.join(&format!(
            "storage/v1/object/public/{}/{path}",
            self.config.bucket
        ))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl PhotoStorage for SupabaseStorageClient {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let url = self
            .config
            .project_url
            .join(&format!("storage/v1/object/{}/{path}", self.config.bucket))?;

        let size = bytes.len();
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                service: "object storage",
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(path, size, "Photo uploaded");
        self.public_url(path)
    }
}
