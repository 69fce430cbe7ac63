//! Bazaar configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BazaarError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BazaarConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Public origin used to build confirmation links, e.g. `https://bazaar.example`.
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub tokens: TokenStoreConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

fn default_name() -> String { "bazaar".into() }
fn default_domain() -> String { "http://localhost:8000".into() }

impl Default for BazaarConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            domain: default_domain(),
            gateway: GatewayConfig::default(),
            tokens: TokenStoreConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl BazaarConfig {
    /// Load config from the default path (~/.bazaar/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BazaarError::Config(format!("Failed to read config: {e}")))?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| BazaarError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(self.domain.starts_with("http://") || self.domain.starts_with("https://")) {
            return Err(BazaarError::Config(format!(
                "domain must be an http(s) origin, got '{}'",
                self.domain
            )));
        }
        if !matches!(self.tokens.backend.as_str(), "sqlite" | "memory") {
            return Err(BazaarError::Config(format!(
                "unknown token store backend '{}'",
                self.tokens.backend
            )));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Bazaar home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bazaar")
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Confirmation token storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStoreConfig {
    /// `sqlite` or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Tokens older than this are treated as unknown. 0 keeps them forever.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

fn default_backend() -> String { "sqlite".into() }
fn default_db_path() -> String { "~/.bazaar/tasks.db".into() }
fn default_ttl() -> u64 { 7 * 24 * 3600 }
fn default_purge_interval() -> u64 { 3600 }

impl TokenStoreConfig {
    pub fn ttl(&self) -> Option<std::time::Duration> {
        (self.ttl_secs > 0).then(|| std::time::Duration::from_secs(self.ttl_secs))
    }
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
            ttl_secs: default_ttl(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

/// Delivery channels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub bot_token: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn bool_true() -> bool { true }
fn default_telegram_api() -> String { "https://api.telegram.org".into() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_smtp_port() -> u16 { 587 }
fn default_subject() -> String { "Bazaar notification".into() }
