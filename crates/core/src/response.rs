//! Responses flowing back through the intercept layer.
//!
//! Bodies are always fully buffered in a [`Bytes`] so that a response can be
//! handed to the caller and written to a store at the same time; cloning only
//! bumps a reference count.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

use crate::Error;

/// Body of the synthetic response returned for unreachable API requests.
pub const OFFLINE_JSON_BODY: &str = r#"{"ok":false,"error":"Offline"}"#;

/// A buffered HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Plain 503 with an empty body, used when neither network nor store can answer.
    pub fn unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, HeaderMap::new(), Bytes::new())
    }

    /// Structured 503 for API requests that could not be served.
    pub fn offline_json() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::new(StatusCode::SERVICE_UNAVAILABLE, headers, Bytes::from_static(OFFLINE_JSON_BODY.as_bytes()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as a string, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set a header, replacing every existing value for that name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Headers as ordered name/raw value pairs, for persistence.
    ///
    /// Values are kept as bytes so obs-text survives a store round trip.
    pub fn header_pairs(&self) -> Vec<(String, Vec<u8>)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect()
    }

    /// Rebuild a response from persisted parts.
    pub fn from_parts(status: u16, pairs: &[(String, Vec<u8>)], body: Vec<u8>) -> Result<Self, Error> {
        let status = StatusCode::from_u16(status).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(pairs.len());
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::CorruptEntry(e.to_string()))?;
            let value = HeaderValue::from_bytes(value).map_err(|e| Error::CorruptEntry(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Self::new(status, headers, body))
    }
}
