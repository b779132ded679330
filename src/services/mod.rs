pub mod otp;
pub use otp::{CodeSource, FixedCode, MemoryOtpBackend, OtpBackend, OtpError, OtpStore, RandomCodes};

pub mod notification;
pub use notification::{LogSender, NotificationSender, OutgoingMail, SendError};

pub mod image_host;
pub use image_host::{ImageHost, ImageHostError};

pub mod credential_service;
pub mod credential_service_impl;
pub use credential_service::{CredentialError, CredentialService};
pub use credential_service_impl::SeaOrmCredentialService;

pub mod verification;
pub use verification::{
    PendingAction, VerificationError, VerificationOutcome, VerificationWorkflow,
};

pub mod roster_service;
pub mod roster_service_impl;
pub use roster_service::{NewMember, RosterError, RosterService, RosterView};
pub use roster_service_impl::SeaOrmRosterService;
