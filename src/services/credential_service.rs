//! Domain service for accounts and passwords.
//!
//! Handles signup persistence, password reset, login, and the pending-reset
//! marker stored on the account row.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::Account;

/// Errors specific to credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    WrongPassword,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CredentialError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for credentials.
#[async_trait::async_trait]
pub trait CredentialService: Send + Sync {
    /// Creates an account with a salted argon2id hash of `password`.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::ValidationFailed`] for an empty username or short password.
    /// - [`CredentialError::DuplicateEmail`] / [`CredentialError::DuplicateUsername`]
    ///   when the unique index rejects the row.
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, CredentialError>;

    /// Overwrites the password of the account registered under `email`
    /// and clears its pending-reset marker.
    async fn reset_password(&self, email: &str, new_password: &str)
    -> Result<(), CredentialError>;

    /// Verifies a password for the account matching `identifier` as username or email.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::UserNotFound`] or [`CredentialError::WrongPassword`].
    async fn authenticate(&self, identifier: &str, password: &str)
    -> Result<Account, CredentialError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CredentialError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, CredentialError>;

    async fn mark_pending_reset(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CredentialError>;

    async fn clear_pending_reset(&self, email: &str) -> Result<(), CredentialError>;

    /// Returns the number of markers cleared.
    async fn clear_expired_pending_resets(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, CredentialError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, CredentialError>;

    /// # Errors
    ///
    /// Returns [`CredentialError::UserNotFound`] if no account has this id.
    async fn delete_account(&self, id: i32) -> Result<(), CredentialError>;
}
