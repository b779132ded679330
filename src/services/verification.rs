//! OTP-gated signup and password reset.
//!
//! Per email the workflow moves `NoPendingOtp -> OtpIssued -> Verified | Expired`,
//! with a wrong code leaving the entry issued until the attempt budget runs out.
//! The code is consumed before the account is touched, so a replay can never
//! mutate twice.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::Account;
use crate::domain::{OtpPurpose, is_plausible_email, normalize_email};
use crate::services::credential_service::{CredentialError, CredentialService};
use crate::services::notification::{NotificationSender, OutgoingMail, send_with_timeout};
use crate::services::otp::{OtpError, OtpStore};

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Failed to send OTP email: {0}")]
    DeliveryFailed(String),
}

/// What a verified code should do.
#[derive(Debug, Clone)]
pub enum PendingAction {
    CompleteSignup { username: String, password: String },
    ResetPassword { new_password: String },
}

impl PendingAction {
    #[must_use]
    pub const fn purpose(&self) -> OtpPurpose {
        match self {
            Self::CompleteSignup { .. } => OtpPurpose::Signup,
            Self::ResetPassword { .. } => OtpPurpose::PasswordReset,
        }
    }

    /// Payload checks that must pass before a code is spent on this action.
    fn check_payload(&self, min_password_length: usize) -> Result<(), VerificationError> {
        let password = match self {
            Self::CompleteSignup { username, password } => {
                if username.trim().is_empty() {
                    return Err(VerificationError::Validation(
                        "Username is required".to_string(),
                    ));
                }
                password
            }
            Self::ResetPassword { new_password } => new_password,
        };

        if password.is_empty() {
            return Err(VerificationError::Validation(
                "Password is required".to_string(),
            ));
        }
        if password.chars().count() < min_password_length {
            return Err(VerificationError::Validation(format!(
                "Password must be at least {min_password_length} characters"
            )));
        }
        Ok(())
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    AccountCreated(Account),
    PasswordReset,
}

#[derive(Clone)]
pub struct VerificationWorkflow {
    otp: OtpStore,
    credentials: Arc<dyn CredentialService>,
    notifier: Arc<dyn NotificationSender>,
    delivery_timeout: Duration,
    min_password_length: usize,
}

impl VerificationWorkflow {
    #[must_use]
    pub fn new(
        otp: OtpStore,
        credentials: Arc<dyn CredentialService>,
        notifier: Arc<dyn NotificationSender>,
        delivery_timeout: Duration,
    ) -> Self {
        Self {
            otp,
            credentials,
            notifier,
            delivery_timeout,
            min_password_length: 1,
        }
    }

    #[must_use]
    pub fn with_min_password_length(mut self, min_password_length: usize) -> Self {
        self.min_password_length = min_password_length;
        self
    }

    #[must_use]
    pub const fn otp_store(&self) -> &OtpStore {
        &self.otp
    }

    /// Issues a code for `email` and emails it.
    ///
    /// # Errors
    ///
    /// - `Validation` for a missing or malformed email.
    /// - `Credential(UserNotFound)` when resetting an unknown account.
    /// - `Credential(DuplicateEmail)` when signing up an existing address.
    /// - `DeliveryFailed` when the mail transport did not acknowledge; the code
    ///   is withdrawn in that case.
    pub async fn request_otp(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<(), VerificationError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(VerificationError::Validation("Email is required".to_string()));
        }
        if !is_plausible_email(&email) {
            return Err(VerificationError::Validation(
                "Invalid email address".to_string(),
            ));
        }

        let existing = self.credentials.find_by_email(&email).await?;
        match (purpose, existing.is_some()) {
            (OtpPurpose::PasswordReset, false) => {
                return Err(CredentialError::UserNotFound.into());
            }
            (OtpPurpose::Signup, true) => return Err(CredentialError::DuplicateEmail.into()),
            _ => {}
        }

        let issued = self.otp.issue(&email, purpose).await;
        if purpose == OtpPurpose::PasswordReset {
            self.credentials
                .mark_pending_reset(&email, &issued.code, issued.expires_at)
                .await?;
        }

        let mail = OutgoingMail::new(
            email.clone(),
            purpose.email_subject(),
            format!("Your OTP is: {}", issued.code),
        );

        if let Err(e) = send_with_timeout(self.notifier.as_ref(), &mail, self.delivery_timeout).await
        {
            warn!(purpose = %purpose, error = %e, "OTP delivery failed, withdrawing code");
            self.otp.invalidate(&email).await;
            if purpose == OtpPurpose::PasswordReset {
                if let Err(clear_err) = self.credentials.clear_pending_reset(&email).await {
                    warn!(error = %clear_err, "Failed to clear pending reset marker");
                }
            }
            return Err(VerificationError::DeliveryFailed(e.to_string()));
        }

        info!(purpose = %purpose, "OTP issued and delivered");
        Ok(())
    }

    /// Checks `code` and performs `action`.
    ///
    /// # Errors
    ///
    /// `Otp(InvalidOtp | OtpExpired | TooManyAttempts)` when the code is rejected,
    /// otherwise whatever the credential service reports for the mutation.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        action: PendingAction,
    ) -> Result<VerificationOutcome, VerificationError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(VerificationError::Validation("Email is required".to_string()));
        }
        if code.trim().is_empty() {
            return Err(VerificationError::Validation("OTP is required".to_string()));
        }
        action.check_payload(self.min_password_length)?;

        self.otp.verify(&email, code, action.purpose()).await?;

        match action {
            PendingAction::CompleteSignup { username, password } => {
                let account = self
                    .credentials
                    .create_account(&username, &email, &password)
                    .await?;
                Ok(VerificationOutcome::AccountCreated(account))
            }
            PendingAction::ResetPassword { new_password } => {
                self.credentials
                    .reset_password(&email, &new_password)
                    .await?;
                Ok(VerificationOutcome::PasswordReset)
            }
        }
    }
}
