use axum::{Json, extract::rejection::JsonRejection};

use super::ApiError;
use crate::domain::{YearRange, is_plausible_email, normalize_email};

/// Unwraps a JSON body, turning a missing, malformed or mistyped body into a 400.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(p)| p)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

pub fn validate_id(id: i32, what: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            what, id
        )));
    }
    Ok(id)
}

/// Returns the normalized address.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !is_plausible_email(&normalized) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(normalized)
}

pub fn validate_year_range(value: &str) -> Result<YearRange, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("yearRange is required"));
    }
    trimmed
        .parse::<YearRange>()
        .map_err(|e| ApiError::validation(e.to_string()))
}

pub fn validate_required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn validate_event_time(value: &str) -> Result<String, ApiError> {
    let trimmed = validate_required("eventTime", value)?;
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|_| trimmed.to_string())
        .map_err(|_| ApiError::validation("eventTime must be an RFC 3339 timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "user").is_ok());
        assert!(validate_id(0, "user").is_err());
        assert!(validate_id(-3, "event").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Foo@Example.ORG ").unwrap(),
            "foo@example.org"
        );
        assert!(validate_email("").is_err());
        assert!(validate_email("foo").is_err());
    }

    #[test]
    fn test_validate_year_range() {
        assert_eq!(validate_year_range("2023-2024").unwrap().end(), 2024);
        assert!(validate_year_range("").is_err());
        assert!(validate_year_range("2023").is_err());
        assert!(validate_year_range("2023-24").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("name", "  Ada ").unwrap(), "Ada");
        assert!(validate_required("name", "   ").is_err());
    }

    #[test]
    fn test_validate_event_time() {
        assert!(validate_event_time("2024-03-01T18:00:00Z").is_ok());
        assert!(validate_event_time("next friday").is_err());
    }
}
