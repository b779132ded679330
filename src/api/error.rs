use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{
    CredentialError, ImageHostError, OtpError, RosterError, VerificationError,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    TooManyRequests(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::TooManyRequests(msg) => write!(f, "Too many requests: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{} service is unavailable", service),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::InvalidOtp | OtpError::OtpExpired => {
                ApiError::ValidationError(err.to_string())
            }
            OtpError::TooManyAttempts => ApiError::TooManyRequests(err.to_string()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::ValidationFailed(msg) => ApiError::ValidationError(msg),
            CredentialError::DuplicateEmail | CredentialError::DuplicateUsername => {
                ApiError::Conflict(err.to_string())
            }
            CredentialError::UserNotFound => ApiError::NotFound(err.to_string()),
            CredentialError::WrongPassword => ApiError::Unauthorized(err.to_string()),
            CredentialError::Database(msg) => ApiError::DatabaseError(msg),
            CredentialError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Validation(msg) => ApiError::ValidationError(msg),
            VerificationError::Otp(e) => e.into(),
            VerificationError::Credential(e) => e.into(),
            VerificationError::DeliveryFailed(msg) => ApiError::mail_error(msg),
        }
    }
}

impl From<ImageHostError> for ApiError {
    fn from(err: ImageHostError) -> Self {
        match err {
            ImageHostError::InvalidImage => ApiError::ValidationError(err.to_string()),
            ImageHostError::NotConfigured | ImageHostError::UpstreamUnavailable(_) => {
                ApiError::image_host_error(err.to_string())
            }
        }
    }
}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::ValidationFailed(msg) => ApiError::ValidationError(msg),
            RosterError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            RosterError::Conflict(msg) => ApiError::Conflict(msg),
            RosterError::ImageHost(e) => e.into(),
            RosterError::Database(msg) => ApiError::DatabaseError(msg),
            RosterError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn mail_error(msg: impl Into<String>) -> Self {
        ApiError::ExternalApiError {
            service: "Mail".to_string(),
            message: msg.into(),
        }
    }

    pub fn image_host_error(msg: impl Into<String>) -> Self {
        ApiError::ExternalApiError {
            service: "Image host".to_string(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(status_of(OtpError::InvalidOtp), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(OtpError::OtpExpired), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(OtpError::TooManyAttempts),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(CredentialError::UserNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CredentialError::WrongPassword),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CredentialError::DuplicateUsername),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(VerificationError::DeliveryFailed("down".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(RosterError::ImageHost(ImageHostError::UpstreamUnavailable(
                "x".to_string()
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CredentialError::Database("locked".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
