//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::SocketAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 60_000;

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < MIN_TIMEOUT_MS {
        return Err(invalid(field, format!("must be at least {MIN_TIMEOUT_MS}ms")));
    }
    if value > MAX_TIMEOUT_MS {
        return Err(invalid(field, format!("must not exceed {MAX_TIMEOUT_MS}ms")));
    }
    Ok(())
}

fn check_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(invalid(field, "must be an absolute http(s) URL")),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB, or is not above `min_icon_bytes`
    /// - any timeout is below 100ms or above 60s
    /// - a user agent is empty
    /// - `bind_addr` is not a socket address
    /// - `public_base_url` or `default_icon_url` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }
        if self.min_icon_bytes >= self.max_bytes {
            return Err(invalid("min_icon_bytes", "must be smaller than max_bytes"));
        }

        check_timeout("probe_timeout_ms", self.probe_timeout_ms)?;
        check_timeout("page_timeout_ms", self.page_timeout_ms)?;
        check_timeout("icon_timeout_ms", self.icon_timeout_ms)?;
        check_timeout("store_timeout_ms", self.store_timeout_ms)?;

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.browser_user_agent.trim().is_empty() {
            return Err(invalid("browser_user_agent", "must not be empty"));
        }

        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| invalid("bind_addr", e.to_string()))?;

        check_http_url("public_base_url", &self.public_base_url)?;
        check_http_url("default_icon_url", &self.default_icon_url)?;

        if self.admin_emails.is_empty() {
            tracing::warn!("admin_emails is empty; link directory is read-only");
        }

        if self.allow_private_networks {
            tracing::warn!("allow_private_networks is set; outbound fetches may reach internal addresses");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_min_icon_bytes_not_below_max() {
        let config = AppConfig { max_bytes: 100, min_icon_bytes: 100, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "min_icon_bytes"));
    }

    #[test]
    fn test_validate_probe_timeout_too_small() {
        let config = AppConfig { probe_timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "probe_timeout_ms"));
    }

    #[test]
    fn test_validate_store_timeout_too_large() {
        let config = AppConfig { store_timeout_ms: 61_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "store_timeout_ms"));
    }

    #[test]
    fn test_validate_empty_browser_user_agent() {
        let config = AppConfig { browser_user_agent: "  ".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "browser_user_agent"));
    }

    #[test]
    fn test_validate_bad_bind_addr() {
        let config = AppConfig { bind_addr: "localhost".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "bind_addr"));
    }

    #[test]
    fn test_validate_default_icon_url_scheme() {
        let config = AppConfig { default_icon_url: "ftp://example.com/icon.ico".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "default_icon_url"));
    }

    #[test]
    fn test_validate_public_base_url_unparsable() {
        let config = AppConfig { public_base_url: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "public_base_url"));
    }
}
