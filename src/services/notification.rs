//! Outbound email.
//!
//! OTP delivery awaits the transport under a timeout and only reports success
//! once it acknowledged. The contact relay is fire-and-forget. Neither retries.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Mail transport rejected the message: {0}")]
    Rejected(String),

    #[error("Mail transport unreachable: {0}")]
    Transport(String),

    #[error("Mail delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Acknowledgement from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub reply_to: Option<String>,
}

impl OutgoingMail {
    #[must_use]
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            reply_to: None,
        }
    }

    #[must_use]
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }
}

/// Email delivery abstraction.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver a message, returning once the transport accepted it.
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, SendError>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryReceipt, SendError> {
        let message_id = Uuid::new_v4().to_string();
        info!(
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            message_id = %message_id,
            "email send stub"
        );
        Ok(DeliveryReceipt { message_id })
    }
}

/// Sends `mail`, giving up after `timeout`.
///
/// # Errors
///
/// Returns the transport error, or [`SendError::Timeout`].
pub async fn send_with_timeout(
    sender: &dyn NotificationSender,
    mail: &OutgoingMail,
    timeout: Duration,
) -> Result<DeliveryReceipt, SendError> {
    match tokio::time::timeout(timeout, sender.send(mail)).await {
        Ok(result) => result,
        Err(_) => Err(SendError::Timeout(timeout)),
    }
}

/// Hands `mail` to a background task; failures are only logged.
pub fn send_in_background(
    sender: Arc<dyn NotificationSender>,
    mail: OutgoingMail,
    timeout: Duration,
) {
    tokio::spawn(async move {
        match send_with_timeout(sender.as_ref(), &mail, timeout).await {
            Ok(receipt) => info!(
                to = %mail.to,
                message_id = %receipt.message_id,
                "Background email delivered"
            ),
            Err(e) => error!(to = %mail.to, error = %e, "Background email failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl NotificationSender for Stalled {
        async fn send(&self, _mail: &OutgoingMail) -> Result<DeliveryReceipt, SendError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(DeliveryReceipt {
                message_id: "late".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn log_sender_acknowledges() {
        let receipt = LogSender
            .send(&OutgoingMail::new("a@example.com", "Hi", "Body"))
            .await
            .unwrap();
        assert!(!receipt.message_id.is_empty());
    }

    #[tokio::test]
    async fn slow_transport_times_out() {
        let mail = OutgoingMail::new("a@example.com", "Hi", "Body");
        let err = send_with_timeout(&Stalled, &mail, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Timeout(_)));
    }
}
