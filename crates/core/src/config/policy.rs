//! Validated caching policy consumed by the intercept engine.

use std::time::Duration;

use url::Url;

use super::{AppConfig, ConfigError};

/// Store names of the current generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub static_store: String,
    pub tile_store: String,
    pub api_store: String,
}

impl StoreNames {
    /// Stores that survive a lifecycle sweep.
    pub fn keep_set(&self) -> [&str; 3] {
        [self.static_store.as_str(), self.tile_store.as_str(), self.api_store.as_str()]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keep_set().contains(&name)
    }
}

/// Immutable routing and caching policy.
#[derive(Debug, Clone)]
pub struct Policy {
    pub origin: Url,
    pub tile_hosts: Vec<String>,
    pub api_prefix: String,
    pub network_timeout: Duration,
    pub tile_max_age_secs: u64,
    pub stores: StoreNames,
    pub offline_url: Url,
    pub precache: Vec<Url>,
}

impl Policy {
    /// Value written into the Cache-Control header of stored tiles.
    pub fn tile_cache_control(&self) -> String {
        format!("max-age={}", self.tile_max_age_secs)
    }

    /// Resolve a path or absolute URL against the configured origin.
    pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
        self.origin.join(target).map_err(|e| ConfigError::Invalid {
            field: "origin".into(),
            reason: format!("cannot resolve {target}: {e}"),
        })
    }
}

impl AppConfig {
    /// Derive the engine policy from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the origin or a precache entry
    /// cannot be parsed.
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        let origin = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        let mut policy = Policy {
            offline_url: origin.clone(),
            origin,
            tile_hosts: self.tile_hosts.iter().map(|h| h.trim().to_lowercase()).collect(),
            api_prefix: self.api_prefix.clone(),
            network_timeout: self.network_timeout(),
            tile_max_age_secs: self.tile_max_age_secs,
            stores: self.store_names(),
            precache: Vec::with_capacity(self.precache.len()),
        };

        policy.offline_url = policy.resolve(&self.offline_path)?;
        for path in &self.precache {
            let url = policy.resolve(path)?;
            policy.precache.push(url);
        }

        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = AppConfig::default().policy().unwrap();
        assert_eq!(policy.offline_url.as_str(), "http://localhost:8080/offline.html");
        assert_eq!(policy.network_timeout, Duration::from_millis(5000));
        assert_eq!(policy.tile_cache_control(), "max-age=604800");
        assert_eq!(policy.precache.len(), 8);
        assert_eq!(policy.precache[0].as_str(), "http://localhost:8080/");
        assert_eq!(policy.precache[7].as_str(), "http://localhost:8080/icons/icon-512.png");
    }

    #[test]
    fn test_keep_set() {
        let policy = AppConfig::default().policy().unwrap();
        assert_eq!(policy.stores.keep_set(), ["waystation-static-v1", "waystation-tiles-v1", "waystation-api-v1"]);
        assert!(policy.stores.contains("waystation-api-v1"));
        assert!(!policy.stores.contains("waystation-api-v0"));
    }

    #[test]
    fn test_tile_hosts_normalized() {
        let config = AppConfig { tile_hosts: vec![" Tiles.Example.NET ".into()], ..Default::default() };
        let policy = config.policy().unwrap();
        assert_eq!(policy.tile_hosts, vec!["tiles.example.net"]);
    }

    #[test]
    fn test_absolute_precache_entries_kept() {
        let config = AppConfig { precache: vec!["https://cdn.example.com/app.js".into()], ..Default::default() };
        let policy = config.policy().unwrap();
        assert_eq!(policy.precache[0].as_str(), "https://cdn.example.com/app.js");
    }

    #[test]
    fn test_invalid_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        assert!(matches!(config.policy(), Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }
}
