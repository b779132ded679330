use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::parse_body;
use super::{AccountDto, ApiError, ApiResponse, AppState};
use crate::services::CredentialError;

const SESSION_KEY: &str = "account_id";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub username_or_email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/login
/// Authenticate by username or email and start a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let payload = parse_body(payload)?;

    if payload.username_or_email.trim().is_empty() {
        return Err(ApiError::validation("Username or email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // Unknown account and wrong password answer the same way.
    let account = match state
        .credentials()
        .authenticate(&payload.username_or_email, &payload.password)
        .await
    {
        Ok(account) => account,
        Err(CredentialError::UserNotFound | CredentialError::WrongPassword) => {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_KEY, account.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(account_id = account.id, "Login succeeded");

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        account.into(),
    )))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, Json(ApiResponse::ack("Logged out")))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let id = get_session_account(&session).await?;

    let account = state
        .credentials()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ApiResponse::success(account.into())))
}

async fn get_session_account(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
