//! Short-lived one-time codes keyed by normalized email.
//!
//! Entries live only in process memory. A restart drops every pending code and
//! the scheduler's purge job keeps the map bounded between restarts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::OtpConfig;
use crate::domain::{OtpPurpose, normalize_email};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Too many failed attempts, request a new OTP")]
    TooManyAttempts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpEntry {
    /// Distinguishes this issuance from a later one for the same email.
    pub id: Uuid,
    pub code: String,
    pub purpose: OtpPurpose,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: u32,
}

impl OtpEntry {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Outcome of recording a wrong submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    StillPending,
    Exhausted,
    Gone,
}

/// Storage behind the OTP store.
#[async_trait]
pub trait OtpBackend: Send + Sync {
    async fn put(&self, key: &str, entry: OtpEntry);

    async fn get(&self, key: &str) -> Option<OtpEntry>;

    async fn remove(&self, key: &str) -> Option<OtpEntry>;

    /// Removes the entry only if it is still the issuance identified by `id`.
    async fn remove_if_current(&self, key: &str, id: Uuid) -> bool;

    /// Bumps the failure counter of issuance `id`, dropping it once `max_attempts` is reached.
    async fn record_failure(&self, key: &str, id: Uuid, max_attempts: u32) -> FailureOutcome;

    /// Drops entries expired at `now` and returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    async fn len(&self) -> usize;
}

#[derive(Default)]
pub struct MemoryOtpBackend {
    entries: RwLock<HashMap<String, OtpEntry>>,
}

impl MemoryOtpBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpBackend for MemoryOtpBackend {
    async fn put(&self, key: &str, entry: OtpEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn get(&self, key: &str) -> Option<OtpEntry> {
        self.entries.read().await.get(key).cloned()
    }

    async fn remove(&self, key: &str) -> Option<OtpEntry> {
        self.entries.write().await.remove(key)
    }

    async fn remove_if_current(&self, key: &str, id: Uuid) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.id == id => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    async fn record_failure(&self, key: &str, id: Uuid, max_attempts: u32) -> FailureOutcome {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key).filter(|e| e.id == id) else {
            return FailureOutcome::Gone;
        };

        entry.failed_attempts += 1;
        if entry.failed_attempts >= max_attempts {
            entries.remove(key);
            FailureOutcome::Exhausted
        } else {
            FailureOutcome::StillPending
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Produces the digits sent to the user.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Uniform six-digit codes, leading zeros included.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> String {
        let n: u32 = rand::rng().random_range(0..1_000_000);
        format!("{n:06}")
    }
}

/// Always hands out the same code.
#[derive(Debug, Clone)]
pub struct FixedCode(pub String);

impl CodeSource for FixedCode {
    fn next_code(&self) -> String {
        self.0.clone()
    }
}

/// Expiry per purpose plus the wrong-code budget.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    pub signup_expiry: Duration,
    pub reset_expiry: Duration,
    pub max_attempts: u32,
}

impl OtpPolicy {
    #[must_use]
    pub const fn expiry_for(&self, purpose: OtpPurpose) -> Duration {
        match purpose {
            OtpPurpose::Signup => self.signup_expiry,
            OtpPurpose::PasswordReset => self.reset_expiry,
        }
    }
}

impl From<&OtpConfig> for OtpPolicy {
    fn from(config: &OtpConfig) -> Self {
        Self {
            signup_expiry: Duration::seconds(
                i64::try_from(config.signup_expiry_seconds).unwrap_or(i64::MAX / 1000),
            ),
            reset_expiry: Duration::seconds(
                i64::try_from(config.reset_expiry_seconds).unwrap_or(i64::MAX / 1000),
            ),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// A freshly minted code and when it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct OtpStore {
    backend: Arc<dyn OtpBackend>,
    codes: Arc<dyn CodeSource>,
    policy: OtpPolicy,
}

impl OtpStore {
    #[must_use]
    pub fn new(
        backend: Arc<dyn OtpBackend>,
        codes: Arc<dyn CodeSource>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            backend,
            codes,
            policy,
        }
    }

    #[must_use]
    pub fn in_memory(config: &OtpConfig) -> Self {
        Self::new(
            Arc::new(MemoryOtpBackend::new()),
            Arc::new(RandomCodes),
            OtpPolicy::from(config),
        )
    }

    #[must_use]
    pub const fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn OtpBackend> {
        Arc::clone(&self.backend)
    }

    /// Mints a code for `identity`, replacing any code still pending for it.
    pub async fn issue(&self, identity: &str, purpose: OtpPurpose) -> IssuedOtp {
        let key = normalize_email(identity);
        let now = Utc::now();
        let entry = OtpEntry {
            id: Uuid::new_v4(),
            code: self.codes.next_code(),
            purpose,
            issued_at: now,
            expires_at: now + self.policy.expiry_for(purpose),
            failed_attempts: 0,
        };
        let issued = IssuedOtp {
            code: entry.code.clone(),
            expires_at: entry.expires_at,
        };

        self.backend.put(&key, entry).await;
        issued
    }

    /// Checks `code` and consumes the entry on a match.
    ///
    /// # Errors
    ///
    /// - [`OtpError::InvalidOtp`] when nothing is pending, the purpose differs,
    ///   the code is wrong, or a concurrent submission consumed it first.
    /// - [`OtpError::OtpExpired`] when the entry is past its expiry (it is removed).
    /// - [`OtpError::TooManyAttempts`] when this wrong code used up the budget.
    pub async fn verify(
        &self,
        identity: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> Result<(), OtpError> {
        let key = normalize_email(identity);
        let Some(entry) = self.backend.get(&key).await else {
            return Err(OtpError::InvalidOtp);
        };

        if entry.is_expired(Utc::now()) {
            self.backend.remove_if_current(&key, entry.id).await;
            return Err(OtpError::OtpExpired);
        }

        if entry.purpose != purpose || entry.code != code.trim() {
            return match self
                .backend
                .record_failure(&key, entry.id, self.policy.max_attempts)
                .await
            {
                FailureOutcome::Exhausted => Err(OtpError::TooManyAttempts),
                FailureOutcome::StillPending | FailureOutcome::Gone => Err(OtpError::InvalidOtp),
            };
        }

        if self.backend.remove_if_current(&key, entry.id).await {
            Ok(())
        } else {
            Err(OtpError::InvalidOtp)
        }
    }

    pub async fn invalidate(&self, identity: &str) {
        self.backend.remove(&normalize_email(identity)).await;
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        self.backend.purge_expired(now).await
    }

    pub async fn pending(&self) -> usize {
        self.backend.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(code: &str, policy: OtpPolicy) -> OtpStore {
        OtpStore::new(
            Arc::new(MemoryOtpBackend::new()),
            Arc::new(FixedCode(code.to_string())),
            policy,
        )
    }

    fn policy() -> OtpPolicy {
        OtpPolicy::from(&OtpConfig::default())
    }

    #[test]
    fn random_codes_are_six_digits() {
        for _ in 0..200 {
            let code = RandomCodes.next_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn code_is_single_use() {
        let store = store_with("123456", policy());
        store.issue("user@example.com", OtpPurpose::Signup).await;

        assert_eq!(
            store
                .verify("user@example.com", "123456", OtpPurpose::Signup)
                .await,
            Ok(())
        );
        assert_eq!(
            store
                .verify("user@example.com", "123456", OtpPurpose::Signup)
                .await,
            Err(OtpError::InvalidOtp)
        );
    }

    #[tokio::test]
    async fn identity_is_normalized() {
        let store = store_with("000042", policy());
        store.issue("  User@Example.com", OtpPurpose::Signup).await;

        assert!(
            store
                .verify("user@example.com", "000042", OtpPurpose::Signup)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn expired_entry_is_rejected_and_removed() {
        let store = store_with("123456", policy());
        let backend = store.backend();
        let past = Utc::now() - Duration::minutes(20);
        backend
            .put(
                "user@example.com",
                OtpEntry {
                    id: Uuid::new_v4(),
                    code: "123456".to_string(),
                    purpose: OtpPurpose::PasswordReset,
                    issued_at: past,
                    expires_at: past + Duration::minutes(10),
                    failed_attempts: 0,
                },
            )
            .await;

        assert_eq!(
            store
                .verify("user@example.com", "123456", OtpPurpose::PasswordReset)
                .await,
            Err(OtpError::OtpExpired)
        );
        assert_eq!(store.pending().await, 0);
    }

    #[tokio::test]
    async fn purpose_mismatch_is_invalid() {
        let store = store_with("123456", policy());
        store.issue("user@example.com", OtpPurpose::Signup).await;

        assert_eq!(
            store
                .verify("user@example.com", "123456", OtpPurpose::PasswordReset)
                .await,
            Err(OtpError::InvalidOtp)
        );
        // Still pending for its own purpose.
        assert!(
            store
                .verify("user@example.com", "123456", OtpPurpose::Signup)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn attempt_budget_discards_entry() {
        let store = store_with("123456", policy());
        store.issue("user@example.com", OtpPurpose::Signup).await;

        for _ in 0..4 {
            assert_eq!(
                store
                    .verify("user@example.com", "999999", OtpPurpose::Signup)
                    .await,
                Err(OtpError::InvalidOtp)
            );
        }
        assert_eq!(
            store
                .verify("user@example.com", "999999", OtpPurpose::Signup)
                .await,
            Err(OtpError::TooManyAttempts)
        );
        assert_eq!(
            store
                .verify("user@example.com", "123456", OtpPurpose::Signup)
                .await,
            Err(OtpError::InvalidOtp)
        );
    }

    #[tokio::test]
    async fn reissue_replaces_pending_code() {
        let store = store_with("111111", policy());
        store.issue("user@example.com", OtpPurpose::Signup).await;
        store.issue("user@example.com", OtpPurpose::PasswordReset).await;

        assert_eq!(store.pending().await, 1);
        assert!(
            store
                .verify("user@example.com", "111111", OtpPurpose::PasswordReset)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn concurrent_correct_submissions_succeed_once() {
        let store = store_with("123456", policy());
        store.issue("race@example.com", OtpPurpose::Signup).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .verify("race@example.com", "123456", OtpPurpose::Signup)
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let store = store_with("123456", policy());
        store.issue("fresh@example.com", OtpPurpose::Signup).await;
        let removed = store
            .purge_expired(Utc::now() + Duration::minutes(11))
            .await;
        assert_eq!(removed, 1);

        store.issue("fresh@example.com", OtpPurpose::Signup).await;
        assert_eq!(store.purge_expired(Utc::now()).await, 0);
        assert_eq!(store.pending().await, 1);
    }
}
