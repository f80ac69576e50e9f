//! Canned fetcher and result decoding for tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use waystation_client::{FetchError, Fetcher, Interceptor};
use waystation_core::header::{self, HeaderMap, HeaderValue};
use waystation_core::{AppConfig, CacheDb, Request, Response, StatusCode};

/// Serves fixed responses; anything else fails like a dropped connection.
#[derive(Default)]
pub(crate) struct CannedFetcher {
    responses: HashMap<String, Response>,
}

impl CannedFetcher {
    pub(crate) fn with(mut self, target: &str, response: Response) -> Self {
        let key = Request::get(target).unwrap().target().to_string();
        self.responses.insert(key, response);
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.responses
            .get(request.target())
            .cloned()
            .ok_or_else(|| FetchError::Transport("connection refused".into()))
    }
}

pub(crate) fn html(body: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    Response::new(StatusCode::OK, headers, body.to_string())
}

/// Interceptor over an in-memory database with the default policy.
pub(crate) async fn interceptor(fetcher: CannedFetcher) -> (Arc<Interceptor>, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let policy = AppConfig::default().policy().unwrap();
    let interceptor = Interceptor::new(policy, db.clone(), Arc::new(fetcher)).unwrap();
    (Arc::new(interceptor), db)
}

pub(crate) fn decode<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
