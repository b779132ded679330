use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::parse_body;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::OtpPurpose;
use crate::services::{PendingAction, VerificationOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub new_password: Option<String>,
    pub purpose: Option<OtpPurpose>,
}

impl OtpVerifyRequest {
    /// A `newPassword` means reset; `username` + `password` means signup.
    /// An explicit `purpose` settles payloads carrying both.
    fn into_action(self) -> Result<(String, String, PendingAction), ApiError> {
        let wants_reset = match self.purpose {
            Some(OtpPurpose::PasswordReset) => true,
            Some(OtpPurpose::Signup) => false,
            None => self.new_password.is_some(),
        };

        let action = if wants_reset {
            let new_password = self
                .new_password
                .ok_or_else(|| ApiError::validation("newPassword is required"))?;
            PendingAction::ResetPassword { new_password }
        } else {
            match (self.username, self.password) {
                (Some(username), Some(password)) => {
                    PendingAction::CompleteSignup { username, password }
                }
                _ => {
                    return Err(ApiError::validation(
                        "Provide username and password to sign up, or newPassword to reset",
                    ));
                }
            }
        };

        Ok((self.email, self.otp, action))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAccount {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// POST /otp/request
/// Issue a one-time code and email it
pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OtpRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let payload = parse_body(payload)?;

    state
        .verification()
        .request_otp(&payload.email, payload.purpose)
        .await?;

    Ok(Json(ApiResponse::ack("OTP sent to your email")))
}

/// POST /otp/verify
/// Check a code and complete the signup or password reset it was issued for
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OtpVerifyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedAccount>>), ApiError> {
    let (email, otp, action) = parse_body(payload)?.into_action()?;

    match state.verification().verify(&email, &otp, action).await? {
        VerificationOutcome::AccountCreated(account) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::with_message(
                "User created successfully",
                CreatedAccount {
                    id: account.id,
                    username: account.username,
                    email: account.email,
                },
            )),
        )),
        VerificationOutcome::PasswordReset => Ok((
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                message: Some("Password reset successful".to_string()),
                data: None,
            }),
        )),
    }
}
