//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::state::ServerState;
use crate::tools::distill_html::{DistillHtmlParams, distill_html_impl};
use crate::tools::extract_markdown::{MarkdownExtractParams, extract_markdown_clean_impl, extract_markdown_impl};
use crate::tools::extract_urls::{UrlExtractParams, extract_dynamic_impl, extract_static_impl};

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

/// The main MCP server handler for pagedistill.
#[derive(Clone)]
pub struct PageDistillServer {
    tool_router: ToolRouter<Self>,
    state: Arc<ServerState>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PageDistillServer {
    /// Create a new server handler.
    pub fn new(state: ServerState) -> Self {
        Self { tool_router: Self::tool_router(), state: Arc::new(state) }
    }

    /// Distill raw HTML into Markdown, metadata and a classified URL list.
    /// No network requests are made.
    #[tool(
        description = "Distill raw HTML into Markdown with title, description, headings, images, tables and a deduplicated URL list. No network access."
    )]
    async fn distill_html(&self, params: Parameters<DistillHtmlParams>) -> Result<CallToolResult, McpError> {
        distill_html_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Fetch a static page over HTTP and return its classified URLs, plain text, structured content and raw HTML."
    )]
    async fn extract_static(&self, params: Parameters<UrlExtractParams>) -> Result<CallToolResult, McpError> {
        extract_static_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Render a JavaScript-heavy page in a headless browser and return its classified URLs, plain text and rendered HTML. File links are excluded by default."
    )]
    async fn extract_dynamic(&self, params: Parameters<UrlExtractParams>) -> Result<CallToolResult, McpError> {
        extract_dynamic_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Load a page (rendered when a browser is enabled, fetched otherwise) and convert it to Markdown with metadata, URLs and the raw HTML, text and structured views."
    )]
    async fn extract_markdown(&self, params: Parameters<MarkdownExtractParams>) -> Result<CallToolResult, McpError> {
        extract_markdown_impl(&self.state, params.0).await
    }

    #[tool(description = "Same as extract_markdown without the raw HTML, text and structured views.")]
    async fn extract_markdown_clean(
        &self, params: Parameters<MarkdownExtractParams>,
    ) -> Result<CallToolResult, McpError> {
        extract_markdown_clean_impl(&self.state, params.0).await
    }
}

impl ServerHandler for PageDistillServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pagedistill".into(),
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
