//! MCP tool implementations.
//!
//! This module contains all tools exposed by the pagedistill server plus the
//! parameter blocks they share.

pub mod distill_html;
pub mod extract_markdown;
pub mod extract_urls;

use pagedistill_client::fetch::normalize_page_url;
use pagedistill_client::{DistillOptions, LinkPolicy};
use pagedistill_core::Error;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Plain HTTP GET.
    Fetch,
    /// Headless browser.
    Render,
}

/// Link classification parameters shared by every tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LinkParams {
    /// Keep links on the page's own host (default: true).
    #[serde(default = "default_true")]
    pub include_internal: bool,

    /// Keep links to other hosts (default: true).
    #[serde(default = "default_true")]
    pub include_external: bool,

    /// Cap on the number of URLs returned. 0 or absent means no cap.
    #[serde(default)]
    pub max_links: Option<usize>,

    /// Drop links to images, archives, media and similar files.
    /// Defaults to the server configuration for the calling tool.
    #[serde(default)]
    pub exclude_file_types: Option<bool>,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self { include_internal: true, include_external: true, max_links: None, exclude_file_types: None }
    }
}

impl LinkParams {
    pub fn policy(&self, default_exclude_file_types: bool) -> LinkPolicy {
        LinkPolicy {
            include_internal: self.include_internal,
            include_external: self.include_external,
            max_links: self.max_links,
            exclude_file_types: self.exclude_file_types.unwrap_or(default_exclude_file_types),
        }
    }
}

/// Markdown rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarkdownParams {
    /// Render images as Markdown images (default: true).
    #[serde(default = "default_true")]
    pub include_images: bool,

    /// Render tables as Markdown tables (default: true).
    #[serde(default = "default_true")]
    pub include_tables: bool,

    /// Strip boilerplate and narrow to the main content first (default: true).
    #[serde(default = "default_true")]
    pub clean_html: bool,
}

impl Default for MarkdownParams {
    fn default() -> Self {
        Self { include_images: true, include_tables: true, clean_html: true }
    }
}

fn default_true() -> bool {
    true
}

/// Combine markdown and link parameters into distillation options.
pub fn distill_options(markdown: &MarkdownParams, links: LinkPolicy) -> DistillOptions {
    DistillOptions {
        include_images: markdown.include_images,
        include_tables: markdown.include_tables,
        clean_html: markdown.clean_html,
        links,
    }
}

/// Validate a page URL parameter.
pub fn parse_page_url(url: &str) -> Result<Url, Error> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    normalize_page_url(url).map_err(|e| Error::InvalidUrl(e.to_string()))
}

/// Serialize a tool output as pretty JSON text content.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let body = serde_json::to_string_pretty(output)
        .map_err(|e| McpError::internal_error(format!("failed to serialize output: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(body)]))
}
