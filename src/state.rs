use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::imgbb::ImgbbClient;
use crate::clients::mail::HttpMailSender;
use crate::config::{Config, MailProvider};
use crate::db::Store;
use crate::services::{
    CodeSource, CredentialService, ImageHost, LogSender, MemoryOtpBackend, NotificationSender,
    OtpStore, RandomCodes, RosterService, SeaOrmCredentialService, SeaOrmRosterService,
    VerificationWorkflow, otp::OtpPolicy,
};

/// External collaborators, swappable for in-process doubles.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn NotificationSender>,
    pub image_host: Arc<dyn ImageHost>,
    pub codes: Arc<dyn CodeSource>,
}

impl Collaborators {
    /// Builds the production collaborators described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let notifier: Arc<dyn NotificationSender> = match config.mail.provider {
            MailProvider::Log => Arc::new(LogSender),
            MailProvider::Http => Arc::new(HttpMailSender::new(&config.mail)),
        };

        Self {
            notifier,
            image_host: Arc::new(ImgbbClient::new(&config.image_host)),
            codes: Arc::new(RandomCodes),
        }
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub notifier: Arc<dyn NotificationSender>,

    pub image_host: Arc<dyn ImageHost>,

    pub credentials: Arc<dyn CredentialService>,

    pub verification: VerificationWorkflow,

    pub roster: Arc<dyn RosterService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let collaborators = Collaborators::from_config(&config);
        Self::with_collaborators(config, collaborators).await
    }

    pub async fn with_collaborators(
        config: Config,
        collaborators: Collaborators,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let Collaborators {
            notifier,
            image_host,
            codes,
        } = collaborators;

        let credentials = Arc::new(SeaOrmCredentialService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn CredentialService>;

        let otp = OtpStore::new(
            Arc::new(MemoryOtpBackend::new()),
            codes,
            OtpPolicy::from(&config.otp),
        );

        let verification = VerificationWorkflow::new(
            otp,
            credentials.clone(),
            notifier.clone(),
            Duration::from_secs(config.mail.timeout_seconds),
        )
        .with_min_password_length(config.security.min_password_length);

        let roster = Arc::new(SeaOrmRosterService::new(store.clone(), image_host.clone()))
            as Arc<dyn RosterService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            notifier,
            image_host,
            credentials,
            verification,
            roster,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
