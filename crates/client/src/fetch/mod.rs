//! Upstream fetch pipeline.
//!
//! ### Contract
//! - Non-2xx answers are returned as responses, never as errors.
//! - Transport failures (connectivity loss, DNS, reset, transport timeout,
//!   oversized body) are all reported as [`FetchError`]; callers treat them
//!   uniformly.
//!
//! ### Buffering
//! - Bodies are read fully into [`Bytes`] before a response leaves this module.
//! - Max body bytes: 5MB (configurable)

use bytes::Bytes;
use reqwest::Client;
use std::time::{Duration, Instant};

use waystation_core::{Error, Request, Response};

/// Transport level failure talking to the origin.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("no response after {0}ms")]
    Timeout(u64),

    #[error("{len} bytes exceeds {max}")]
    TooLarge { len: usize, max: usize },
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(ms) => Error::Timeout(ms),
            other => Error::Fetch(other.to_string()),
        }
    }
}

/// Anything that can take a request to the network.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Send the request and buffer the answer.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "waystation/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Transport timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "waystation/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method().clone(), request.url().as_str())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchError::TooLarge { len: len as usize, max: self.config.max_bytes });
        }

        let status = response.status();
        let headers = response.headers().clone();

        let bytes: Bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(FetchError::TooLarge { len: bytes.len(), max: self.config.max_bytes });
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url(),
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response::new(status, headers, bytes))
    }
}
