//! Caching strategies.
//!
//! Each strategy is a free function over one store and a [`Fetcher`]; none of
//! them can fail. Transport errors, timeouts and store errors are resolved
//! here into a cached answer, the offline document or a synthetic 503.

use std::time::Duration;

use waystation_core::header::{self, HeaderValue};
use waystation_core::{Request, Response, Store};

use crate::fetch::Fetcher;

/// Store lookup where a store failure counts as a miss.
async fn lookup(store: &Store, request: &Request) -> Option<Response> {
    match store.get(request).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(store = store.name(), url = %request.url(), error = %e, "store read failed");
            None
        }
    }
}

/// Best-effort write; a failed write only costs a future cache miss.
async fn write_back(store: &Store, request: &Request, response: &Response) {
    if let Err(e) = store.put(request, response).await {
        tracing::warn!(store = store.name(), url = %request.url(), error = %e, "store write failed");
    }
}

/// Serve from the store, fetch and remember on a miss.
///
/// When the network is unreachable the offline document is looked up in the
/// same (static) store; failing that a plain 503 is returned.
pub async fn cache_first(fetcher: &dyn Fetcher, store: &Store, offline: &Request, request: &Request) -> Response {
    if let Some(cached) = lookup(store, request).await {
        tracing::debug!("cache hit for {}", request.url());
        return cached;
    }

    match fetcher.fetch(request).await {
        Ok(response) => {
            if response.is_success() {
                write_back(store, request, &response).await;
            }
            response
        }
        Err(e) => {
            tracing::debug!(url = %request.url(), error = %e, "network unavailable, trying offline document");
            lookup(store, offline).await.unwrap_or_else(Response::unavailable)
        }
    }
}

/// Race the network against `timeout`, falling back to the store.
///
/// The timed-out fetch is dropped, which cancels it; its late result is never
/// written.
pub async fn network_first(fetcher: &dyn Fetcher, store: &Store, request: &Request, timeout: Duration) -> Response {
    match tokio::time::timeout(timeout, fetcher.fetch(request)).await {
        Ok(Ok(response)) => {
            if response.is_success() {
                write_back(store, request, &response).await;
            }
            return response;
        }
        Ok(Err(e)) => {
            tracing::debug!(url = %request.url(), error = %e, "network unavailable, falling back to store");
        }
        Err(_) => {
            tracing::debug!(
                url = %request.url(),
                timeout_ms = timeout.as_millis() as u64,
                "network timed out, falling back to store"
            );
        }
    }

    lookup(store, request).await.unwrap_or_else(Response::offline_json)
}

/// Serve tiles from the store; on a miss fetch, stamp Cache-Control and store.
///
/// The hint is advisory: nothing evicts or revalidates stored tiles.
pub async fn tile_cache(
    fetcher: &dyn Fetcher, store: &Store, request: &Request, cache_control: &HeaderValue,
) -> Response {
    if let Some(cached) = lookup(store, request).await {
        tracing::debug!("tile cache hit for {}", request.url());
        return cached;
    }

    match fetcher.fetch(request).await {
        Ok(response) if response.is_success() => {
            let derived = response.with_header(header::CACHE_CONTROL, cache_control.clone());
            write_back(store, request, &derived).await;
            derived
        }
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(url = %request.url(), error = %e, "tile unavailable");
            Response::unavailable()
        }
    }
}

/// Forward a non-retrieval request untouched; nothing is read or written.
pub async fn passthrough(fetcher: &dyn Fetcher, request: &Request) -> Response {
    match fetcher.fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(method = %request.method(), url = %request.url(), error = %e, "passthrough failed");
            Response::unavailable()
        }
    }
}
