//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. host is (a subdomain of) a tile origin -> [`Strategy::TileCache`]
//! 2. path starts with the API prefix -> [`Strategy::NetworkFirst`]
//! 3. anything else -> [`Strategy::CacheFirst`]

use serde::Serialize;
use waystation_core::{Policy, Request};

/// Caching policy applied to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    TileCache,
}

/// Strategy and store selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub strategy: Strategy,
    pub store: &'a str,
}

/// Select the strategy and store for a request.
pub fn classify<'a>(policy: &'a Policy, request: &Request) -> Route<'a> {
    let host = request.host();
    if policy.tile_hosts.iter().any(|tile_host| host_matches(host, tile_host)) {
        return Route { strategy: Strategy::TileCache, store: &policy.stores.tile_store };
    }

    if request.path().starts_with(&policy.api_prefix) {
        return Route { strategy: Strategy::NetworkFirst, store: &policy.stores.api_store };
    }

    Route { strategy: Strategy::CacheFirst, store: &policy.stores.static_store }
}

/// Exact host or any subdomain of it. A trailing root dot is ignored.
fn host_matches(host: &str, origin: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    host == origin
        || host
            .strip_suffix(origin)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
