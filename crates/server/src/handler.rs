//! MCP server handler implementation.
//!
//! Routes tool calls to the intercept entry point and the control channel of
//! a single generation.
use std::sync::Arc;

use crate::tools::{
    control::{CacheUrlsParams, cache_urls_impl, skip_waiting_impl},
    intercept::{InterceptParams, intercept_impl},
    stores::store_list_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use waystation_client::Interceptor;

/// The MCP server handler for waystation.
#[derive(Clone)]
pub struct WaystationServer {
    interceptor: Arc<Interceptor>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WaystationServer {
    pub fn new(interceptor: Arc<Interceptor>) -> Self {
        Self { interceptor, tool_router: Self::tool_router() }
    }

    /// Route a request through the offline caching layer.
    #[tool(
        description = "Route a request through the offline cache. Static assets are served cache-first, /api/ calls \
                       network-first with a 5s fallback to the last stored answer, and map tiles from a long-lived \
                       tile store. Waits until the cache generation is active."
    )]
    async fn intercept(&self, params: Parameters<InterceptParams>) -> Result<CallToolResult, McpError> {
        intercept_impl(&self.interceptor, params.0).await
    }

    /// Add URLs to the static store, all or nothing.
    #[tool(description = "Fetch URLs into the static store. Nothing is stored unless every URL succeeds.")]
    async fn cache_urls(&self, params: Parameters<CacheUrlsParams>) -> Result<CallToolResult, McpError> {
        cache_urls_impl(&self.interceptor, params.0).await
    }

    /// Force activation of the waiting generation.
    #[tool(description = "Activate the current cache generation now, deleting stores left by older versions.")]
    async fn skip_waiting(&self) -> Result<CallToolResult, McpError> {
        skip_waiting_impl(&self.interceptor).await
    }

    /// List persisted stores.
    #[tool(description = "List persisted cache stores with their entry counts.")]
    async fn store_list(&self) -> Result<CallToolResult, McpError> {
        store_list_impl(self.interceptor.db()).await
    }
}

impl ServerHandler for WaystationServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "waystation".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
