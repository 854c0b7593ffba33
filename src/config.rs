//! Configuration loading.
//!
//! Loads docrelay configuration from `./docrelay.toml` (or
//! `$DOCRELAY_CONFIG_PATH`). A missing file yields defaults so the pure
//! subcommands work without any setup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::channel::cloud_api::{DEFAULT_API_VERSION, DEFAULT_BASE_URL};

/// Top-level docrelay configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Persistent store settings.
    pub store: StoreConfig,
    /// Retry worker settings.
    pub worker: WorkerConfig,
    /// One entry per tenant with a WhatsApp Cloud API account.
    #[serde(rename = "tenant")]
    pub tenants: Vec<TenantConfig>,
}

/// Persistent store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("docrelay.db"),
        }
    }
}

/// Retry worker settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds to sleep between polls when the queue is empty.
    pub poll_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

/// Cloud API account settings for one tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
    /// Tenant identifier used in send requests and store rows.
    pub id: String,
    /// Business phone number id messages are sent from.
    pub phone_number_id: String,
    /// Graph API bearer token.
    pub access_token: String,
    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Graph API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whether sends are enabled for this tenant.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Advisory per-day message cap (enforced upstream, recorded here).
    #[serde(default)]
    pub daily_message_limit: Option<u32>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_active() -> bool {
    true
}

impl RelayConfig {
    /// Load configuration from the TOML file, or defaults if none exists.
    ///
    /// Path: `$DOCRELAY_CONFIG_PATH` or `./docrelay.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                toml::from_str(&contents).context("failed to parse config TOML")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Find the config block for a tenant id.
    pub fn tenant(&self, tenant_id: &str) -> Option<&TenantConfig> {
        self.tenants.iter().find(|t| t.id == tenant_id)
    }

    /// Resolve the config file path.
    fn config_path() -> PathBuf {
        std::env::var("DOCRELAY_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("docrelay.toml"))
    }
}
