use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MailConfig;
use crate::services::notification::{DeliveryReceipt, NotificationSender, OutgoingMail, SendError};

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct RelayResponse {
    #[serde(alias = "messageId", alias = "message_id")]
    id: Option<String>,
}

/// Delivers mail by POSTing JSON to an HTTP relay (bearer-token authenticated).
#[derive(Clone)]
pub struct HttpMailSender {
    client: Client,
    api_url: String,
    api_token: String,
    from_address: String,
}

impl HttpMailSender {
    #[must_use]
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent("Clubdesk/1.0")
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            from_address: config.from_address.clone(),
        }
    }
}

#[async_trait]
impl NotificationSender for HttpMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, SendError> {
        let request = RelayRequest {
            from: &self.from_address,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.body,
            reply_to: mail.reply_to.as_deref(),
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if !self.api_token.is_empty() {
            builder = builder.bearer_auth(&self.api_token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Mail relay rejected message");
            return Err(SendError::Rejected(format!("status={status}")));
        }

        // Some relays answer 202 with an empty body.
        let message_id = response
            .json::<RelayResponse>()
            .await
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        debug!(to = %mail.to, message_id = %message_id, "Mail accepted by relay");
        Ok(DeliveryReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_request_shape() {
        let request = RelayRequest {
            from: "no-reply@example.com",
            to: "user@example.com",
            subject: "Your OTP for Signup",
            text: "Your OTP is: 123456",
            reply_to: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "user@example.com");
        assert!(json.get("reply_to").is_none());
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        let sender = HttpMailSender::new(&MailConfig {
            api_url: "http://127.0.0.1:9/send".to_string(),
            timeout_seconds: 2,
            ..MailConfig::default()
        });

        let err = sender
            .send(&OutgoingMail::new("a@example.com", "s", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
    }
}
