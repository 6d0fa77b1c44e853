//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The app secret is loaded from FEISHU_APP_SECRET or app_secret_file,
//! never stored in the TOML directly.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::{Secret, resolve_secret};
use serde::Deserialize;
use token_refresh::RefreshConfig;

pub const APP_SECRET_ENV: &str = "FEISHU_APP_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub refresh: RefreshSettings,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    pub server: ServerConfig,
}

/// How the app is distributed on the Feishu platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    /// Self-built app, tokens from app id + secret.
    Internal,
    /// App store app, tokens bound to the pushed app ticket.
    Public,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub app_id: String,
    pub mode: AppMode,
    #[serde(skip, default = "unresolved_secret")]
    pub app_secret: Secret<String>,
    /// Path to a file containing the app secret (alternative to FEISHU_APP_SECRET)
    #[serde(default)]
    pub app_secret_file: Option<PathBuf>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Tenant keys to keep tenant tokens for (public mode only)
    #[serde(default)]
    pub tenants: Vec<String>,
}

/// Refresh cadence, in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RefreshSettings {
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval_secs(),
            retry_interval_secs: default_retry_interval_secs(),
        }
    }
}

impl RefreshSettings {
    pub fn to_refresh_config(self) -> token_refresh::Result<RefreshConfig> {
        RefreshConfig::new(
            Duration::from_secs(self.update_interval_secs),
            Duration::from_secs(self.retry_interval_secs),
        )
    }
}

/// Event subscription settings
#[derive(Debug, Deserialize)]
pub struct WebhookConfig {
    pub verification_token: String,
    /// Ask Feishu to push the app ticket right after startup (public mode)
    #[serde(default = "default_true")]
    pub request_ticket_on_start: bool,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn unresolved_secret() -> Secret<String> {
    Secret::new(String::new())
}

fn default_base_url() -> String {
    feishu_auth::DEFAULT_BASE_URL.to_owned()
}

fn default_update_interval_secs() -> u64 {
    token_refresh::DEFAULT_UPDATE_INTERVAL.as_secs()
}

fn default_retry_interval_secs() -> u64 {
    token_refresh::DEFAULT_RETRY_INTERVAL.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> usize {
    256
}

impl Config {
    /// Load configuration from a TOML file, validate it, then resolve the
    /// app secret.
    ///
    /// App secret resolution order:
    /// 1. FEISHU_APP_SECRET env var
    /// 2. app_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        config.app.app_secret =
            resolve_secret(APP_SECRET_ENV, config.app.app_secret_file.as_deref())?;

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if self.app.app_id.trim().is_empty() {
            return Err(common::Error::Config("app_id must not be empty".into()));
        }

        if !self.app.base_url.starts_with("http://") && !self.app.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                self.app.base_url
            )));
        }

        match self.app.mode {
            AppMode::Internal if !self.app.tenants.is_empty() => {
                return Err(common::Error::Config(
                    "tenants are only used in public mode".into(),
                ));
            }
            AppMode::Public if self.webhook.is_none() => {
                return Err(common::Error::Config(
                    "public mode needs a [webhook] section to receive app tickets".into(),
                ));
            }
            _ => {}
        }

        if self.app.tenants.iter().any(|t| t.trim().is_empty()) {
            return Err(common::Error::Config("tenant keys must not be empty".into()));
        }

        if let Some(webhook) = &self.webhook {
            if webhook.verification_token.is_empty() {
                return Err(common::Error::Config(
                    "webhook.verification_token must not be empty".into(),
                ));
            }
        }

        self.refresh
            .to_refresh_config()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        if self.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("feishu-token-agent.toml")
    }
}
