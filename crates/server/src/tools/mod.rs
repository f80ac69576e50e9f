//! MCP tool implementations.
//!
//! `intercept` is the entry point into the caching layer; the rest form the
//! control channel.

pub mod control;
pub mod intercept;
pub mod stores;

#[cfg(test)]
pub(crate) mod test_support;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ToolError;

/// Wrap a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
