//! intercept tool implementation.
//!
//! Routes one request through the caching layer and reports the response the
//! page would have received.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waystation_client::Interceptor;
use waystation_core::{Error, Method, Request};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the intercept tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InterceptParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET). Anything but GET bypasses the stores.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Output from the intercept tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InterceptOutput {
    pub url: String,
    pub status: u16,
    pub ok: bool,
    /// Header name/value pairs in response order; values decoded as UTF-8, lossy.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
    pub body_len: usize,
}

pub async fn intercept_impl(interceptor: &Interceptor, params: InterceptParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| ToolError::InvalidInput(format!("method {:?}: {e}", params.method)))?;
    let url = interceptor
        .policy()
        .resolve(&params.url)
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(method, url.as_str())?;

    let response = interceptor.handle(&request).await;

    let output = InterceptOutput {
        url: request.target().to_string(),
        status: response.status().as_u16(),
        ok: response.is_success(),
        headers: response
            .header_pairs()
            .into_iter()
            .map(|(name, value)| (name, String::from_utf8_lossy(&value).into_owned()))
            .collect(),
        body: String::from_utf8_lossy(response.body()).into_owned(),
        body_len: response.body().len(),
    };

    Ok(json_result(&output)?)
}
