//! Contract for the external image host.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("Image data is empty or not valid base64")]
    InvalidImage,

    #[error("Image host is not configured")]
    NotConfigured,

    #[error("Image host unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Uploads an image and returns its public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// `image` is the base64 payload, optionally prefixed with a `data:` URL header.
    async fn upload(&self, image: &str) -> Result<String, ImageHostError>;
}

/// Strips a `data:<mime>;base64,` prefix if present.
#[must_use]
pub fn strip_data_url(image: &str) -> &str {
    let trimmed = image.trim();
    match trimmed.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => trimmed,
    }
}
