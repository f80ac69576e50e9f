//! Control channel tools: `cache_urls` and `skip_waiting`.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waystation_client::{Interceptor, Phase, SweepFailure};

use super::json_result;

/// Parameters for the cache_urls tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUrlsParams {
    /// URLs or origin-relative paths to add to the static store.
    pub urls: Vec<String>,
}

/// Output from the cache_urls tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheUrlsOutput {
    /// Number of entries written.
    pub cached: usize,
}

/// Output from the skip_waiting tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SkipWaitingOutput {
    /// Phase after the call, always `active`.
    pub phase: String,
    /// Stale stores removed by this activation.
    pub deleted: Vec<String>,
    /// Stale stores that could not be removed.
    pub failed: Vec<FailedStore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedStore {
    pub store: String,
    pub error: String,
}

impl From<SweepFailure> for FailedStore {
    fn from(failure: SweepFailure) -> Self {
        Self { store: failure.store, error: failure.error }
    }
}

pub async fn cache_urls_impl(interceptor: &Interceptor, params: CacheUrlsParams) -> Result<CallToolResult, McpError> {
    let cached = interceptor.prime(&params.urls).await?;
    Ok(json_result(&CacheUrlsOutput { cached })?)
}

pub async fn skip_waiting_impl(interceptor: &Interceptor) -> Result<CallToolResult, McpError> {
    let report = interceptor.activate().await;

    let output = SkipWaitingOutput {
        phase: phase_name(interceptor.phase()).to_string(),
        deleted: report.deleted,
        failed: report.failed.into_iter().map(FailedStore::from).collect(),
    };

    Ok(json_result(&output)?)
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Installing => "installing",
        Phase::Waiting => "waiting",
        Phase::Activating => "activating",
        Phase::Active => "active",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{CannedFetcher, decode, html, interceptor};
    use waystation_core::Request;

    #[tokio::test]
    async fn test_cache_urls() {
        let fetcher = CannedFetcher::default()
            .with("http://localhost:8080/trek.html", html("trek"))
            .with("http://localhost:8080/zones.html", html("zones"));
        let (interceptor, db) = interceptor(fetcher).await;

        let params = CacheUrlsParams { urls: vec!["/trek.html".into(), "/zones.html".into()] };
        let output: CacheUrlsOutput = decode(&cache_urls_impl(&interceptor, params).await.unwrap());

        assert_eq!(output.cached, 2);
        let stored = db
            .open_store("waystation-static-v1")
            .get(&Request::get("http://localhost:8080/zones.html").unwrap())
            .await
            .unwrap();
        assert_eq!(stored, Some(html("zones")));
    }

    #[tokio::test]
    async fn test_cache_urls_failure_writes_nothing() {
        let fetcher = CannedFetcher::default().with("http://localhost:8080/trek.html", html("trek"));
        let (interceptor, db) = interceptor(fetcher).await;

        let params = CacheUrlsParams { urls: vec!["/trek.html".into(), "/gone.html".into()] };
        let err = cache_urls_impl(&interceptor, params).await.unwrap_err();

        assert!(err.message.contains("/gone.html"));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_urls_empty() {
        let (interceptor, _) = interceptor(CannedFetcher::default()).await;
        let err = cache_urls_impl(&interceptor, CacheUrlsParams { urls: vec![] }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_skip_waiting_sweeps_old_generation() {
        let (interceptor, db) = interceptor(CannedFetcher::default()).await;
        let request = Request::get("http://localhost:8080/").unwrap();
        db.open_store("waystation-api-v0").put(&request, &html("old")).await.unwrap();
        db.open_store("waystation-api-v1").put(&request, &html("new")).await.unwrap();

        let output: SkipWaitingOutput = decode(&skip_waiting_impl(&interceptor).await.unwrap());

        assert_eq!(output.phase, "active");
        assert_eq!(output.deleted, vec!["waystation-api-v0".to_string()]);
        assert!(output.failed.is_empty());
        assert_eq!(db.store_names().await.unwrap(), vec!["waystation-api-v1"]);

        let again: SkipWaitingOutput = decode(&skip_waiting_impl(&interceptor).await.unwrap());
        assert!(again.deleted.is_empty());
    }
}
