//! Intercept entry point.
//!
//! [`Interceptor`] is the context object for one generation: the validated
//! policy, the store database, the fetcher and the lifecycle gate. Every
//! outbound request goes through [`Interceptor::handle`], which classifies it
//! and runs the selected strategy against the selected store.
//!
//! ### Strategies
//! - Static assets: cache first, offline document on network failure.
//! - API (`/api/`): network first with a 5s race, store on timeout.
//! - Map tiles: cache first, `Cache-Control: max-age=604800` stamped on store.

pub mod classify;
pub mod lifecycle;
pub mod precache;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use waystation_core::header::HeaderValue;
use waystation_core::{CacheDb, Error, Policy, Request, Response};

use crate::fetch::Fetcher;

pub use classify::{Route, Strategy, classify};
pub use lifecycle::{Phase, StoreCatalog, SweepFailure, SweepReport, sweep};
pub use precache::InstallReport;

/// Context for one generation of the intercept layer.
pub struct Interceptor {
    policy: Policy,
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    offline: Request,
    tile_cache_control: HeaderValue,
    phase: watch::Sender<Phase>,
    activation: Mutex<()>,
}

impl Interceptor {
    /// Build a generation in the `Installing` phase.
    ///
    /// Requests wait in [`Interceptor::handle`] until [`Interceptor::activate`]
    /// has run.
    pub fn new(policy: Policy, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let offline = Request::from_url(policy.offline_url.clone())?;
        let tile_cache_control = HeaderValue::from_str(&policy.tile_cache_control())
            .map_err(|e| Error::InvalidInput(format!("tile cache-control: {e}")))?;
        let (phase, _) = watch::channel(Phase::Installing);

        Ok(Self { policy, db, fetcher, offline, tile_cache_control, phase, activation: Mutex::new(()) })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Serve one outbound request.
    ///
    /// Never fails: every error is resolved into a cached, offline or
    /// synthetic response by the strategy that hit it.
    pub async fn handle(&self, request: &Request) -> Response {
        self.wait_active().await;

        if !request.is_retrieval() {
            return strategy::passthrough(self.fetcher.as_ref(), request).await;
        }

        let route = classify(&self.policy, request);
        let store = self.db.open_store(route.store);
        tracing::debug!(url = %request.url(), strategy = ?route.strategy, store = route.store, "classified");

        let fetcher = self.fetcher.as_ref();
        match route.strategy {
            Strategy::CacheFirst => strategy::cache_first(fetcher, &store, &self.offline, request).await,
            Strategy::NetworkFirst => {
                strategy::network_first(fetcher, &store, request, self.policy.network_timeout).await
            }
            Strategy::TileCache => strategy::tile_cache(fetcher, &store, request, &self.tile_cache_control).await,
        }
    }
}
