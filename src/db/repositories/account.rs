use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::timestamp;
use crate::entities::accounts;

/// Account data returned from the repository (without the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a new account. The password is hashed on a blocking thread.
    ///
    /// Unique-constraint failures are returned with the underlying `DbErr`
    /// intact so callers can tell duplicate emails from duplicate usernames.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<Account> {
        let password = password.to_string();
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let now = timestamp(Utc::now());
        let active = accounts::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            otp_code: Set(None),
            otp_expires_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(Account::from(model))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    /// Looks an account up by username or (normalized) email, returning the hash
    /// alongside it for verification.
    pub async fn get_by_identifier_with_password(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<(Account, String)>> {
        let account = accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Username.eq(username))
                    .add(accounts::Column::Email.eq(email)),
            )
            .order_by_asc(accounts::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query account by username or email")?;

        Ok(account.map(|a| {
            let password_hash = a.password_hash.clone();
            (Account::from(a), password_hash)
        }))
    }

    /// Replaces the password hash and clears any pending reset marker.
    /// Returns false when no account has this email.
    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        let Some(account) = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account for password update")?
        else {
            return Ok(false);
        };

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(new_hash);
        active.otp_code = Set(None);
        active.otp_expires_at = Set(None);
        active.updated_at = Set(timestamp(Utc::now()));
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn set_pending_reset(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::OtpCode, Expr::value(code))
            .col_expr(
                accounts::Column::OtpExpiresAt,
                Expr::value(timestamp(expires_at)),
            )
            .filter(accounts::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to record pending reset")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn clear_pending_reset(&self, email: &str) -> Result<()> {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(
                accounts::Column::OtpExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .filter(accounts::Column::Email.eq(email))
            .exec(&self.conn)
            .await
            .context("Failed to clear pending reset")?;

        Ok(())
    }

    /// Clears reset markers whose expiry is before `now`. Returns how many were cleared.
    pub async fn clear_expired_pending_resets(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::OtpCode, Expr::value(Option::<String>::None))
            .col_expr(
                accounts::Column::OtpExpiresAt,
                Expr::value(Option::<String>::None),
            )
            .filter(accounts::Column::OtpExpiresAt.is_not_null())
            .filter(accounts::Column::OtpExpiresAt.lt(timestamp(now)))
            .exec(&self.conn)
            .await
            .context("Failed to clear expired reset markers")?;

        Ok(result.rows_affected)
    }

    pub async fn pending_reset_expiry(&self, email: &str) -> Result<Option<String>> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query pending reset")?;

        Ok(account.and_then(|a| a.otp_expires_at))
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let rows = accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = accounts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete account")?;

        Ok(result.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verifies `password` against a PHC hash string.
/// The cost parameters are read from the hash itself.
pub async fn verify_password(password_hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_params() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[tokio::test]
    async fn hash_round_trips_through_verify() {
        let hash = hash_password("hunter22", &cheap_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("hunter22"));

        assert!(
            verify_password(hash.clone(), "hunter22".to_string())
                .await
                .unwrap()
        );
        assert!(!verify_password(hash, "hunter23".to_string()).await.unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter22", &cheap_params()).unwrap();
        let b = hash_password("hunter22", &cheap_params()).unwrap();
        assert_ne!(a, b);
    }
}
