use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::validation::{parse_body, validate_email, validate_required};
use super::{ApiError, ApiResponse, AppState};
use crate::services::OutgoingMail;
use crate::services::notification::send_in_background;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// POST /contact
/// Relay a contact-form message to the club inbox. Delivery happens after
/// the response; failures are only logged.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let payload = parse_body(payload)?;

    let name = validate_required("name", &payload.name)?;
    let email = validate_email(&payload.email)?;
    let message = validate_required("message", &payload.message)?;

    let config = state.config().await;
    let mail = OutgoingMail::new(
        config.mail.contact_recipient.clone(),
        format!("Contact form: {name}"),
        format!("From: {name} <{email}>\n\n{message}"),
    )
    .reply_to(email);

    send_in_background(
        state.notifier(),
        mail,
        Duration::from_secs(config.mail.timeout_seconds),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ack("Message received")),
    ))
}
