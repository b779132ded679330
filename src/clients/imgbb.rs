use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::ImageHostConfig;
use crate::services::image_host::{ImageHost, ImageHostError, strip_data_url};

#[derive(Deserialize)]
struct UploadResponse {
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    url: String,
}

/// ImgBB upload client. Images are posted as base64 form fields.
#[derive(Clone)]
pub struct ImgbbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ImgbbClient {
    #[must_use]
    pub fn new(config: &ImageHostConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Clubdesk/1.0")
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, image: &str) -> Result<String, ImageHostError> {
        if self.api_key.is_empty() {
            return Err(ImageHostError::NotConfigured);
        }

        let payload = strip_data_url(image);
        if payload.is_empty() {
            return Err(ImageHostError::InvalidImage);
        }

        let url = Url::parse_with_params(
            &format!("{}/1/upload", self.base_url),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|e| ImageHostError::UpstreamUnavailable(format!("invalid base URL: {e}")))?;
        debug!(bytes = payload.len(), "Uploading image");

        let response = self
            .client
            .post(url)
            .form(&[("image", payload)])
            .send()
            .await
            .map_err(|e| ImageHostError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Image host rejected upload");
            if status.is_client_error() {
                return Err(ImageHostError::InvalidImage);
            }
            return Err(ImageHostError::UpstreamUnavailable(format!(
                "status={status}"
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageHostError::UpstreamUnavailable(e.to_string()))?;

        parsed.data.map(|d| d.url).ok_or_else(|| {
            warn!("Image host response missing data");
            ImageHostError::UpstreamUnavailable("response missing data".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_is_reported_before_any_request() {
        let client = ImgbbClient::new(&ImageHostConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            timeout_seconds: 1,
        });

        assert!(matches!(
            client.upload("QUJD").await,
            Err(ImageHostError::NotConfigured)
        ));
    }

    #[test]
    fn upload_response_parses_url() {
        let parsed: UploadResponse =
            serde_json::from_str(r#"{"data":{"url":"https://i.ibb.co/x.png","id":"x"},"success":true}"#)
                .unwrap();
        assert_eq!(parsed.data.unwrap().url, "https://i.ibb.co/x.png");
    }
}
