//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (NAVHUB_*)
//! 2. TOML config file (if NAVHUB_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::store::RecordWriteMode;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (NAVHUB_*)
/// 2. TOML config file (if NAVHUB_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List fields take figment's array syntax from the environment,
/// e.g. `NAVHUB_ADMIN_EMAILS='["ops@example.com"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding links and blobs.
    ///
    /// Set via NAVHUB_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Externally visible base URL; stored blob URLs are derived from it.
    ///
    /// Set via NAVHUB_PUBLIC_BASE_URL environment variable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// User-Agent for favicon probes and icon downloads.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser-like User-Agent sent when fetching a site's HTML.
    #[serde(default = "default_browser_user_agent")]
    pub browser_user_agent: String,

    /// Maximum bytes to read per outbound response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Timeout for each well-known path probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for the HTML page fetch.
    #[serde(default = "default_page_timeout_ms")]
    pub page_timeout_ms: u64,

    /// Timeout for downloading the chosen icon.
    #[serde(default = "default_icon_timeout_ms")]
    pub icon_timeout_ms: u64,

    /// Deadline for each record/blob store call made by the resolver.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Probe bodies must be strictly larger than this to count as an icon.
    #[serde(default = "default_min_icon_bytes")]
    pub min_icon_bytes: usize,

    /// Icon used when no favicon can be discovered.
    ///
    /// Set via NAVHUB_DEFAULT_ICON_URL environment variable.
    #[serde(default = "default_icon_url")]
    pub default_icon_url: String,

    /// How resolved icons are written back to the link table.
    #[serde(default)]
    pub record_write: RecordWriteMode,

    /// Identities allowed to mutate the directory.
    #[serde(default)]
    pub admin_emails: Vec<String>,

    /// Hosts (and their subdomains) that are never fetched.
    #[serde(default)]
    pub denylist_domains: Vec<String>,

    /// Skip the private/reserved address check. Local development only.
    #[serde(default)]
    pub allow_private_networks: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./navhub.sqlite")
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "navhub/0.1".into()
}

fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_page_timeout_ms() -> u64 {
    3_000
}

fn default_icon_timeout_ms() -> u64 {
    3_000
}

fn default_store_timeout_ms() -> u64 {
    3_000
}

fn default_min_icon_bytes() -> usize {
    100
}

fn default_icon_url() -> String {
    "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/1f310.png".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            user_agent: default_user_agent(),
            browser_user_agent: default_browser_user_agent(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            probe_timeout_ms: default_probe_timeout_ms(),
            page_timeout_ms: default_page_timeout_ms(),
            icon_timeout_ms: default_icon_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            min_icon_bytes: default_min_icon_bytes(),
            default_icon_url: default_icon_url(),
            record_write: RecordWriteMode::default(),
            admin_emails: Vec::new(),
            denylist_domains: Vec::new(),
            allow_private_networks: false,
        }
    }
}

impl AppConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn icon_timeout(&self) -> Duration {
        Duration::from_millis(self.icon_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `NAVHUB_`
    /// 2. TOML file from `NAVHUB_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("NAVHUB_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("NAVHUB_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
