//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WAYSTATION_*)
//! 2. TOML config file (if WAYSTATION_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The defaults carry the caching policy itself (tile hosts, API prefix,
//! timeouts, store generation). The engine never reads this struct directly;
//! it consumes the validated [`Policy`] derived from it.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod policy;
mod validation;

pub use policy::{Policy, StoreNames};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WAYSTATION_*)
/// 2. TOML config file (if WAYSTATION_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List values set through the environment use figment's array syntax,
/// e.g. `WAYSTATION_TILE_HOSTS='["tile.openstreetmap.org"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding every store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin that relative paths (offline document, precache list) resolve against.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes buffered per upstream response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Transport timeout in milliseconds, applied to every upstream request.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long API requests wait for the network before falling back to the store.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// Hosts served by the tile strategy (subdomains match too).
    #[serde(default = "default_tile_hosts")]
    pub tile_hosts: Vec<String>,

    /// Path prefix routed to the network-first strategy.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// max-age written into the Cache-Control header of stored tiles.
    #[serde(default = "default_tile_max_age_secs")]
    pub tile_max_age_secs: u64,

    /// Generation token embedded in the default store names.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Explicit name for the static asset store.
    #[serde(default)]
    pub static_store: Option<String>,

    /// Explicit name for the tile store.
    #[serde(default)]
    pub tile_store: Option<String>,

    /// Explicit name for the API store.
    #[serde(default)]
    pub api_store: Option<String>,

    /// Path of the document served when a static asset cannot be fetched.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Paths fetched into the static store at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Activate right after install instead of waiting for a control message.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./waystation.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_user_agent() -> String {
    "waystation/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_network_timeout_ms() -> u64 {
    5_000
}

fn default_tile_hosts() -> Vec<String> {
    vec!["tile.openstreetmap.org".into(), "tiles.stadiamaps.com".into()]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_tile_max_age_secs() -> u64 {
    604_800 // 7 days
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/trek.html",
        "/onboarding.html",
        "/offline.html",
        "/manifest.json",
        "/icons/icon-192.png",
        "/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            network_timeout_ms: default_network_timeout_ms(),
            tile_hosts: default_tile_hosts(),
            api_prefix: default_api_prefix(),
            tile_max_age_secs: default_tile_max_age_secs(),
            cache_version: default_cache_version(),
            static_store: None,
            tile_store: None,
            api_store: None,
            offline_path: default_offline_path(),
            precache: default_precache(),
            skip_waiting: true,
        }
    }
}

impl AppConfig {
    /// Transport timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Network-first race timeout.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Store names for the current generation, explicit overrides first.
    pub fn store_names(&self) -> StoreNames {
        let version = &self.cache_version;
        StoreNames {
            static_store: self
                .static_store
                .clone()
                .unwrap_or_else(|| format!("waystation-static-{version}")),
            tile_store: self
                .tile_store
                .clone()
                .unwrap_or_else(|| format!("waystation-tiles-{version}")),
            api_store: self
                .api_store
                .clone()
                .unwrap_or_else(|| format!("waystation-api-{version}")),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WAYSTATION_`
    /// 2. TOML file from `WAYSTATION_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("WAYSTATION_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAYSTATION_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
