//! `SeaORM` implementation of the `CredentialService` trait.

use crate::config::SecurityConfig;
use crate::db::{Account, Store, repositories::account::verify_password, unique_violation};
use crate::domain::normalize_email;
use crate::services::credential_service::{CredentialError, CredentialService};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub struct SeaOrmCredentialService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmCredentialService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn validate_password(&self, password: &str) -> Result<(), CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::ValidationFailed(
                "Password is required".to_string(),
            ));
        }
        if password.chars().count() < self.security.min_password_length {
            return Err(CredentialError::ValidationFailed(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialService for SeaOrmCredentialService {
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, CredentialError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CredentialError::ValidationFailed(
                "Username is required".to_string(),
            ));
        }
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(CredentialError::ValidationFailed(
                "Email is required".to_string(),
            ));
        }
        self.validate_password(password)?;

        match self
            .store
            .create_account(username, &email, password, &self.security)
            .await
        {
            Ok(account) => {
                info!(account_id = account.id, "Account created");
                Ok(account)
            }
            Err(e) => match unique_violation(&e) {
                Some(msg) if msg.contains("username") => Err(CredentialError::DuplicateUsername),
                Some(_) => Err(CredentialError::DuplicateEmail),
                None => Err(CredentialError::Database(e.to_string())),
            },
        }
    }

    async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        self.validate_password(new_password)?;

        let updated = self
            .store
            .update_account_password(&normalize_email(email), new_password, &self.security)
            .await?;

        if !updated {
            return Err(CredentialError::UserNotFound);
        }

        info!("Password reset completed");
        Ok(())
    }

    async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Account, CredentialError> {
        let identifier = identifier.trim();
        let (account, password_hash) = self
            .store
            .get_account_with_password(identifier, &normalize_email(identifier))
            .await?
            .ok_or(CredentialError::UserNotFound)?;

        if verify_password(password_hash, password.to_string()).await? {
            Ok(account)
        } else {
            warn!(account_id = account.id, "Failed login attempt");
            Err(CredentialError::WrongPassword)
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CredentialError> {
        Ok(self
            .store
            .get_account_by_email(&normalize_email(email))
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Account>, CredentialError> {
        Ok(self.store.get_account(id).await?)
    }

    async fn mark_pending_reset(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CredentialError> {
        let marked = self
            .store
            .set_pending_reset(&normalize_email(email), code, expires_at)
            .await?;

        if marked {
            Ok(())
        } else {
            Err(CredentialError::UserNotFound)
        }
    }

    async fn clear_pending_reset(&self, email: &str) -> Result<(), CredentialError> {
        Ok(self
            .store
            .clear_pending_reset(&normalize_email(email))
            .await?)
    }

    async fn clear_expired_pending_resets(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, CredentialError> {
        Ok(self.store.clear_expired_pending_resets(now).await?)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, CredentialError> {
        Ok(self.store.list_accounts().await?)
    }

    async fn delete_account(&self, id: i32) -> Result<(), CredentialError> {
        if self.store.delete_account(id).await? {
            info!(account_id = id, "Account deleted");
            Ok(())
        } else {
            Err(CredentialError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmCredentialService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmCredentialService::new(
            store,
            SecurityConfig {
                argon2_memory_cost_kib: 1024,
                argon2_time_cost: 1,
                argon2_parallelism: 1,
                min_password_length: 6,
            },
        )
    }

    #[tokio::test]
    async fn create_then_authenticate_by_username_or_email() {
        let svc = service().await;
        let account = svc
            .create_account(" alice ", "  Alice@Example.com ", "secret1")
            .await
            .unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.email, "alice@example.com");

        assert_eq!(
            svc.authenticate("alice", "secret1").await.unwrap().id,
            account.id
        );
        assert_eq!(
            svc.authenticate("ALICE@example.com", "secret1")
                .await
                .unwrap()
                .id,
            account.id
        );
        assert!(matches!(
            svc.authenticate("alice", "wrong-pass").await,
            Err(CredentialError::WrongPassword)
        ));
        assert!(matches!(
            svc.authenticate("nobody", "secret1").await,
            Err(CredentialError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn duplicates_are_distinguished() {
        let svc = service().await;
        svc.create_account("alice", "alice@example.com", "secret1")
            .await
            .unwrap();

        assert!(matches!(
            svc.create_account("alice2", "ALICE@example.com", "secret1")
                .await,
            Err(CredentialError::DuplicateEmail)
        ));
        assert!(matches!(
            svc.create_account("alice", "other@example.com", "secret1")
                .await,
            Err(CredentialError::DuplicateUsername)
        ));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let svc = service().await;
        assert!(matches!(
            svc.create_account("bob", "bob@example.com", "123").await,
            Err(CredentialError::ValidationFailed(_))
        ));
        assert!(svc.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_password_replaces_hash() {
        let svc = service().await;
        svc.create_account("carol", "carol@example.com", "oldpass")
            .await
            .unwrap();

        svc.reset_password("carol@example.com", "newpass")
            .await
            .unwrap();
        assert!(svc.authenticate("carol", "newpass").await.is_ok());
        assert!(matches!(
            svc.authenticate("carol", "oldpass").await,
            Err(CredentialError::WrongPassword)
        ));

        assert!(matches!(
            svc.reset_password("ghost@example.com", "newpass").await,
            Err(CredentialError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_missing_account_is_not_found() {
        let svc = service().await;
        assert!(matches!(
            svc.delete_account(42).await,
            Err(CredentialError::UserNotFound)
        ));
    }
}
