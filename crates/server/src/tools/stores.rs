//! store_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use waystation_core::CacheDb;

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreEntry {
    pub name: String,
    pub entries: u64,
}

/// Output from the store_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreListOutput {
    pub stores: Vec<StoreEntry>,
}

pub async fn store_list_impl(db: &CacheDb) -> Result<CallToolResult, McpError> {
    let stores = db
        .store_summaries()
        .await?
        .into_iter()
        .map(|s| StoreEntry { name: s.name, entries: s.entries })
        .collect();

    Ok(json_result(&StoreListOutput { stores })?)
}
