//! Outbound requests and target canonicalization.
//!
//! A request is identified by its canonical target URL; two requests whose
//! targets canonicalize to the same string hit the same store entry.

use http::Method;
use url::Url;

use crate::Error;

/// Error type for target canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a target string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    canonicalize_url(parsed)
}

/// Canonicalize an already parsed URL.
pub fn canonicalize_url(mut url: Url) -> Result<Url, UrlError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    url.set_fragment(None);

    Ok(url)
}

/// An outbound request routed through the intercept layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
}

impl Request {
    /// Build a request from a method and a target string.
    pub fn new(method: Method, target: &str) -> Result<Self, Error> {
        let url = canonicalize(target)?;
        Ok(Self { method, url })
    }

    /// Build a retrieval (GET) request.
    pub fn get(target: &str) -> Result<Self, Error> {
        Self::new(Method::GET, target)
    }

    /// Build a retrieval request from a parsed URL.
    pub fn from_url(url: Url) -> Result<Self, Error> {
        Ok(Self { method: Method::GET, url: canonicalize_url(url)? })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host of the target, empty when the URL has none.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Only retrieval requests are eligible for caching.
    pub fn is_retrieval(&self) -> bool {
        self.method == Method::GET
    }

    /// Identity used as the store key.
    pub fn target(&self) -> &str {
        self.url.as_str()
    }
}
