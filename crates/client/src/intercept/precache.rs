//! Filling the static store outside of request handling.
//!
//! - [`Interceptor::install`] runs at startup over the configured asset list;
//!   every entry settles on its own.
//! - [`Interceptor::prime`] serves the `cache_urls` control message and is
//!   all-or-nothing.

use serde::Serialize;
use url::Url;
use waystation_core::{Error, Request, Response};

use super::Interceptor;
use super::lifecycle::Phase;

/// Outcome of the install step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub skipped: Vec<String>,
}

impl Interceptor {
    /// Fetch the precache list into the static store and move to `Waiting`.
    ///
    /// Failed or non-2xx entries are skipped.
    pub async fn install(&self) -> InstallReport {
        let mut report = InstallReport::default();
        let store = self.db.open_store(&self.policy.stores.static_store);

        for url in &self.policy.precache {
            let fetched = match Request::from_url(url.clone()) {
                Ok(request) => self.fetcher.fetch(&request).await.map(|response| (request, response)),
                Err(e) => {
                    tracing::warn!(%url, error = %e, "skipping precache entry");
                    report.skipped.push(url.to_string());
                    continue;
                }
            };

            match fetched {
                Ok((request, response)) if response.is_success() => match store.put(&request, &response).await {
                    Ok(()) => report.cached.push(url.to_string()),
                    Err(e) => {
                        tracing::warn!(%url, error = %e, "could not store precache entry");
                        report.skipped.push(url.to_string());
                    }
                },
                Ok((_, response)) => {
                    tracing::warn!(%url, status = response.status().as_u16(), "skipping precache entry");
                    report.skipped.push(url.to_string());
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "skipping precache entry");
                    report.skipped.push(url.to_string());
                }
            }
        }

        // An activation that raced ahead of install keeps its phase.
        self.phase.send_if_modified(|phase| {
            if *phase == Phase::Installing {
                *phase = Phase::Waiting;
                true
            } else {
                false
            }
        });

        tracing::info!(cached = report.cached.len(), skipped = report.skipped.len(), "install finished");
        report
    }

    /// Fetch every URL and store them all, or store nothing.
    ///
    /// Relative URLs resolve against the configured origin. Returns the number
    /// of entries written.
    pub async fn prime(&self, urls: &[String]) -> Result<usize, Error> {
        if urls.is_empty() {
            return Err(Error::InvalidInput("urls cannot be empty".into()));
        }

        let requests = urls
            .iter()
            .map(|raw| {
                let url: Url = self
                    .policy
                    .resolve(raw)
                    .map_err(|e| Error::InvalidUrl(e.to_string()))?;
                Request::from_url(url)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut fetched: Vec<(Request, Response)> = Vec::with_capacity(requests.len());
        for request in requests {
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| {
                    tracing::warn!(url = %request.url(), error = %e, "could not prime entry");
                    match Error::from(e) {
                        Error::Fetch(msg) => Error::Fetch(format!("{}: {msg}", request.url())),
                        other => other,
                    }
                })?;
            if !response.is_success() {
                return Err(Error::Fetch(format!("{}: status {}", request.url(), response.status().as_u16())));
            }
            fetched.push((request, response));
        }

        let store = self.db.open_store(&self.policy.stores.static_store);
        for (request, response) in &fetched {
            store.put(request, response).await?;
        }

        tracing::info!(count = fetched.len(), "primed static store");
        Ok(fetched.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::test_support::{ScriptedFetcher, ok, status};
    use std::sync::Arc;
    use waystation_core::{AppConfig, CacheDb};

    async fn interceptor(fetcher: ScriptedFetcher, precache: &[&str]) -> (Interceptor, CacheDb) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig { precache: precache.iter().map(|p| p.to_string()).collect(), ..Default::default() };
        let interceptor = Interceptor::new(config.policy().unwrap(), db.clone(), Arc::new(fetcher)).unwrap();
        (interceptor, db)
    }

    fn req(target: &str) -> Request {
        Request::get(target).unwrap()
    }

    #[tokio::test]
    async fn test_install_settles_each_entry() {
        let fetcher = ScriptedFetcher::new()
            .respond("http://localhost:8080/", ok("root"))
            .respond("http://localhost:8080/offline.html", ok("offline"))
            .respond("http://localhost:8080/manifest.json", status(404));
        let precache = ["/", "/offline.html", "/manifest.json", "/icons/icon-192.png"];
        let (interceptor, db) = interceptor(fetcher, &precache).await;

        let report = interceptor.install().await;

        assert_eq!(report.cached, vec!["http://localhost:8080/", "http://localhost:8080/offline.html"]);
        assert_eq!(
            report.skipped,
            vec!["http://localhost:8080/manifest.json", "http://localhost:8080/icons/icon-192.png"]
        );
        assert_eq!(interceptor.phase(), Phase::Waiting);

        let store = db.open_store("waystation-static-v1");
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(store.get(&req("http://localhost:8080/offline.html")).await.unwrap(), Some(ok("offline")));
    }

    #[tokio::test]
    async fn test_prime_stores_everything() {
        let fetcher = ScriptedFetcher::new()
            .respond("http://localhost:8080/trek.html", ok("trek"))
            .respond("https://cdn.example.com/leaflet.js", ok("leaflet"));
        let (interceptor, db) = interceptor(fetcher, &[]).await;

        let count = interceptor
            .prime(&["/trek.html".to_string(), "https://cdn.example.com/leaflet.js".to_string()])
            .await
            .unwrap();

        assert_eq!(count, 2);
        let store = db.open_store("waystation-static-v1");
        assert_eq!(store.get(&req("https://cdn.example.com/leaflet.js")).await.unwrap(), Some(ok("leaflet")));
    }

    #[tokio::test]
    async fn test_prime_is_all_or_nothing() {
        let fetcher = ScriptedFetcher::new()
            .respond("http://localhost:8080/trek.html", ok("trek"))
            .respond("http://localhost:8080/missing.html", status(404));
        let (interceptor, db) = interceptor(fetcher, &[]).await;

        let result = interceptor
            .prime(&["/trek.html".to_string(), "/missing.html".to_string()])
            .await;

        assert!(matches!(result, Err(Error::Fetch(msg)) if msg.contains("/missing.html")));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prime_reports_timeouts() {
        let fetcher = ScriptedFetcher::new()
            .respond("http://localhost:8080/trek.html", ok("trek"))
            .time_out("http://localhost:8080/zones.html");
        let (interceptor, db) = interceptor(fetcher, &[]).await;

        let result = interceptor
            .prime(&["/trek.html".to_string(), "/zones.html".to_string()])
            .await;

        assert!(matches!(result, Err(Error::Timeout(20000))));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prime_rejects_empty_list() {
        let (interceptor, _) = interceptor(ScriptedFetcher::new(), &[]).await;
        assert!(matches!(interceptor.prime(&[]).await, Err(Error::InvalidInput(_))));
    }
}
