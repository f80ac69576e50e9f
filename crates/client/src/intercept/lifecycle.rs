//! Generation lifecycle: stale store sweep and activation.
//!
//! A generation moves `Installing -> Waiting -> Activating -> Active`. The
//! entry point refuses to classify anything before `Active`, so a request can
//! never touch a store the sweep is deleting.

use serde::Serialize;
use waystation_core::config::StoreNames;
use waystation_core::{CacheDb, Error};

use super::Interceptor;

/// Lifecycle phase of the running generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Installing,
    Waiting,
    Activating,
    Active,
}

/// Store listing and deletion as seen by the sweep.
#[async_trait::async_trait]
pub trait StoreCatalog: Send + Sync {
    async fn list_names(&self) -> Result<Vec<String>, Error>;

    async fn delete(&self, name: &str) -> Result<bool, Error>;
}

#[async_trait::async_trait]
impl StoreCatalog for CacheDb {
    async fn list_names(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_store(name).await
    }
}

/// A stale store that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub store: String,
    pub error: String,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub failed: Vec<SweepFailure>,
}

/// Delete every store whose name is not in `keep`.
///
/// Each deletion is independent; failures are logged and reported, never
/// returned as an error.
pub async fn sweep(catalog: &dyn StoreCatalog, keep: &StoreNames) -> SweepReport {
    let mut report = SweepReport::default();

    let names = match catalog.list_names().await {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(error = %e, "could not enumerate stores, skipping sweep");
            return report;
        }
    };

    for name in names.into_iter().filter(|name| !keep.contains(name)) {
        match catalog.delete(&name).await {
            Ok(_) => {
                tracing::info!(store = %name, "deleted stale store");
                report.deleted.push(name);
            }
            Err(e) => {
                tracing::warn!(store = %name, error = %e, "failed to delete stale store");
                report.failed.push(SweepFailure { store: name, error: e.to_string() });
            }
        }
    }

    report
}

impl Interceptor {
    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Sweep stale stores and start accepting requests.
    ///
    /// Activating an already active generation is a no-op with an empty report.
    pub async fn activate(&self) -> SweepReport {
        self.activate_with(&self.db).await
    }

    pub(crate) async fn activate_with(&self, catalog: &dyn StoreCatalog) -> SweepReport {
        let _guard = self.activation.lock().await;
        if self.phase() == Phase::Active {
            return SweepReport::default();
        }

        self.phase.send_replace(Phase::Activating);
        let report = sweep(catalog, &self.policy.stores).await;
        self.phase.send_replace(Phase::Active);

        tracing::info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "generation active"
        );
        report
    }

    /// Park until the generation is active.
    pub(crate) async fn wait_active(&self) {
        let mut rx = self.phase.subscribe();
        let closed = rx.wait_for(|phase| *phase == Phase::Active).await.is_err();
        if closed {
            tracing::warn!("lifecycle channel closed before activation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::test_support::{ScriptedFetcher, ok};
    use std::sync::Arc;
    use std::sync::Mutex;
    use waystation_core::{AppConfig, Request};

    fn keep() -> StoreNames {
        StoreNames { static_store: "v1-static".into(), tile_store: "v1-tile".into(), api_store: "v1-api".into() }
    }

    async fn seed(db: &CacheDb, names: &[&str]) {
        let request = Request::get("http://localhost:8080/").unwrap();
        for name in names {
            db.open_store(name).put(&request, &ok(name)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_stale_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, &["v1-static", "v1-tile", "v1-api", "v0-static"]).await;

        let report = sweep(&db, &keep()).await;

        assert_eq!(report.deleted, vec!["v0-static".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(db.store_names().await.unwrap(), vec!["v1-api", "v1-static", "v1-tile"]);
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_stale() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, &["v1-static"]).await;

        assert_eq!(sweep(&db, &keep()).await, SweepReport::default());
    }

    /// Catalog whose deletion of one store always fails.
    struct FlakyCatalog {
        names: Vec<String>,
        broken: &'static str,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StoreCatalog for FlakyCatalog {
        async fn list_names(&self) -> Result<Vec<String>, Error> {
            Ok(self.names.clone())
        }

        async fn delete(&self, name: &str) -> Result<bool, Error> {
            if name == self.broken {
                return Err(Error::InvalidInput("database is locked".into()));
            }
            self.deleted.lock().unwrap().push(name.to_string());
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_sweep_continues_past_failures() {
        let catalog = FlakyCatalog {
            names: ["v0-api", "v0-static", "v0-tile", "v1-api"].map(String::from).to_vec(),
            broken: "v0-static",
            deleted: Mutex::new(Vec::new()),
        };

        let report = sweep(&catalog, &keep()).await;

        assert_eq!(report.deleted, vec!["v0-api".to_string(), "v0-tile".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].store, "v0-static");
        assert_eq!(*catalog.deleted.lock().unwrap(), report.deleted);
    }

    /// Catalog that cannot enumerate its stores.
    struct UnlistableCatalog;

    #[async_trait::async_trait]
    impl StoreCatalog for UnlistableCatalog {
        async fn list_names(&self) -> Result<Vec<String>, Error> {
            Err(Error::InvalidInput("disk I/O error".into()))
        }

        async fn delete(&self, _name: &str) -> Result<bool, Error> {
            panic!("nothing to delete without a listing");
        }
    }

    #[tokio::test]
    async fn test_activation_completes_when_listing_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let policy = AppConfig::default().policy().unwrap();
        let fetcher = ScriptedFetcher::new().respond("http://localhost:8080/", ok("root"));
        let interceptor = Interceptor::new(policy, db, Arc::new(fetcher)).unwrap();

        let report = interceptor.activate_with(&UnlistableCatalog).await;

        assert_eq!(report, SweepReport::default());
        assert_eq!(interceptor.phase(), Phase::Active);
        let response = interceptor.handle(&Request::get("http://localhost:8080/").unwrap()).await;
        assert_eq!(response, ok("root"));
    }

    #[tokio::test]
    async fn test_activate_sweeps_then_opens_gate() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, &["waystation-static-v0", "waystation-static-v1"]).await;
        let policy = AppConfig::default().policy().unwrap();
        let interceptor = Interceptor::new(policy, db.clone(), Arc::new(ScriptedFetcher::new())).unwrap();
        assert_eq!(interceptor.phase(), Phase::Installing);

        let report = interceptor.activate().await;

        assert_eq!(report.deleted, vec!["waystation-static-v0".to_string()]);
        assert_eq!(interceptor.phase(), Phase::Active);
        assert_eq!(db.store_names().await.unwrap(), vec!["waystation-static-v1"]);

        // A second activation is a no-op.
        assert_eq!(interceptor.activate().await, SweepReport::default());
    }
}
