//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `network_timeout_ms` is less than 100ms or exceeds `timeout_ms`
    /// - `user_agent` is empty
    /// - `api_prefix` or `offline_path` does not start with `/`
    /// - a store name is empty or two store names collide
    /// - `origin` is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.network_timeout_ms < 100 {
            return Err(invalid("network_timeout_ms", "must be at least 100ms"));
        }
        if self.network_timeout_ms > self.timeout_ms {
            return Err(invalid("network_timeout_ms", "must not exceed timeout_ms"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must start with '/'"));
        }
        if !self.offline_path.starts_with('/') {
            return Err(invalid("offline_path", "must start with '/'"));
        }

        let names = self.store_names();
        let [static_store, tile_store, api_store] = names.keep_set();
        if static_store.is_empty() || tile_store.is_empty() || api_store.is_empty() {
            return Err(invalid("stores", "store names must not be empty"));
        }
        if static_store == tile_store || static_store == api_store || tile_store == api_store {
            return Err(invalid("stores", "store names must be distinct"));
        }

        match url::Url::parse(&self.origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(invalid("origin", &format!("unsupported scheme: {}", url.scheme()))),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if self.tile_hosts.is_empty() {
            tracing::warn!("tile_hosts is empty; every request will use the static or API strategy");
        }

        Ok(())
    }
}
