use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub otp: OtpConfig,

    pub mail: MailConfig,

    pub image_host: ImageHostConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Minimum accepted password length for signup and reset.
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Lifetime of a signup verification code.
    pub signup_expiry_seconds: u64,

    /// Lifetime of a password reset code.
    pub reset_expiry_seconds: u64,

    /// Wrong submissions allowed before a pending code is discarded.
    pub max_attempts: u32,

    /// How often expired codes and stale reset markers are swept.
    pub purge_interval_seconds: u64,

    /// Optional cron expression for the sweep; overrides the interval when set.
    pub purge_cron: Option<String>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            signup_expiry_seconds: 10 * 60,
            reset_expiry_seconds: 10 * 60,
            max_attempts: 5,
            purge_interval_seconds: 60,
            purge_cron: None,
        }
    }
}

impl OtpConfig {
    #[must_use]
    pub const fn signup_expiry(&self) -> Duration {
        Duration::from_secs(self.signup_expiry_seconds)
    }

    #[must_use]
    pub const fn reset_expiry(&self) -> Duration {
        Duration::from_secs(self.reset_expiry_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Write messages to the log instead of delivering them.
    #[default]
    Log,
    /// POST messages to an HTTP mail relay.
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub provider: MailProvider,

    /// Endpoint of the HTTP relay (only used with `provider = "http"`).
    pub api_url: String,

    #[serde(skip_serializing)]
    pub api_token: String,

    pub from_address: String,

    /// Where contact-form messages are relayed to.
    pub contact_recipient: String,

    /// Upper bound for a single delivery attempt.
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::Log,
            api_url: String::new(),
            api_token: String::new(),
            from_address: "no-reply@clubdesk.local".to_string(),
            contact_recipient: "admin@clubdesk.local".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostConfig {
    pub base_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    pub timeout_seconds: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.imgbb.com".to_string(),
            api_key: String::new(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whole-request deadline; slower requests are answered with 504.
    pub request_timeout_seconds: u64,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:4200".to_string(),
                "http://127.0.0.1:4200".to_string(),
            ],
            request_timeout_seconds: 60,
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/clubdesk.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            otp: OtpConfig::default(),
            mail: MailConfig::default(),
            image_host: ImageHostConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets are usually supplied through the environment rather than the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLUBDESK_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(key) = std::env::var("CLUBDESK_IMGBB_API_KEY") {
            self.image_host.api_key = key;
        }
        if let Ok(token) = std::env::var("CLUBDESK_MAIL_API_TOKEN") {
            self.mail.api_token = token;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("clubdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".clubdesk").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.otp.signup_expiry_seconds == 0 || self.otp.reset_expiry_seconds == 0 {
            anyhow::bail!("OTP expiry windows must be greater than zero");
        }

        if self.otp.max_attempts == 0 {
            anyhow::bail!("otp.max_attempts must be at least 1");
        }

        if self.mail.provider == MailProvider::Http && self.mail.api_url.is_empty() {
            anyhow::bail!("mail.api_url cannot be empty when the http provider is selected");
        }

        if self.server.request_timeout_seconds == 0 {
            anyhow::bail!("server.request_timeout_seconds must be greater than zero");
        }

        Ok(())
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.otp.reset_expiry_seconds, 600);
        assert_eq!(config.otp.signup_expiry_seconds, 600);
        assert_eq!(config.otp.max_attempts, 5);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.mail.provider, MailProvider::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[otp]"));
        assert!(toml_str.contains("[mail]"));
        assert!(!toml_str.contains("api_token"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [otp]
            signup_expiry_seconds = 1800

            [mail]
            provider = "http"
            api_url = "https://mail.example.com/send"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.otp.signup_expiry_seconds, 1800);
        assert_eq!(config.otp.reset_expiry_seconds, 600);
        assert_eq!(config.mail.provider, MailProvider::Http);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_http_mail_without_url() {
        let mut config = Config::default();
        config.mail.provider = MailProvider::Http;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.otp.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
