//! Image host upload client with bounded retry.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default upload endpoint; overridable via `IMAGE_HOST_URL`.
pub const PIXHOST_API: &str = "https://api.pixhost.to/images";

const SHOW_URL_PREFIX: &str = "https://pixhost.to/show/";
const DIRECT_URL_PREFIX: &str = "https://img1.pixhost.to/images/";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
// pixhost rejects requests without a browser user agent
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36";

pub const UPLOAD_ATTEMPTS: usize = 3;
pub const UPLOAD_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("upload request failed: {0}")]
    Transport(String),
    #[error("image host returned status {status}: {body}")]
    BadStatus { status: u16, body: String },
    #[error("unparsable image host response: {0}")]
    BadResponse(String),
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    show_url: String,
}

/// One upload attempt against an image host; returns the show-page URL.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &Path) -> Result<String, UploadError>;
}

pub struct PixhostClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PixhostClient {
    pub fn new(endpoint: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(UPLOAD_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ImageHost for PixhostClient {
    async fn upload(&self, image: &Path) -> Result<String, UploadError> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("screenshot.jpg")
            .to_owned();
        let form = multipart::Form::new()
            .part("img", multipart::Part::bytes(bytes).file_name(file_name))
            .text("content_type", "0");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::BadResponse(e.to_string()))?;
        Ok(parsed.show_url)
    }
}

/// Upload with bounded retry and linear backoff. Transport errors, non-2xx
/// responses and unparsable bodies are all retried; exhausting the attempts
/// yields the last error.
pub async fn upload_with_retry(
    host: &impl ImageHost,
    image: &Path,
    attempts: usize,
    backoff: Duration,
) -> Result<String, UploadError> {
    let mut last_error = None;
    for attempt in 1..=attempts {
        tracing::info!(attempt, attempts, image = %image.display(), "uploading screenshot");
        match host.upload(image).await {
            Ok(show_url) => {
                tracing::info!(%show_url, "upload succeeded");
                return Ok(show_url);
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "upload attempt failed");
                last_error = Some(e);
            }
        }
        if attempt < attempts {
            tokio::time::sleep(backoff * attempt as u32).await;
        }
    }
    Err(last_error.unwrap_or_else(|| UploadError::Transport(String::from("no attempts made"))))
}

/// Rewrite a pixhost show-page URL into the direct image URL.
pub fn direct_image_url(show_url: &str) -> String {
    show_url.replacen(SHOW_URL_PREFIX, DIRECT_URL_PREFIX, 1)
}
