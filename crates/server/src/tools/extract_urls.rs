//! extract_static and extract_dynamic tool implementations.
//!
//! Both load a page, distill it and report the classified URL list. Static
//! pages are fetched over HTTP, dynamic pages are rendered in the headless
//! browser. Failures after parameter validation come back as records with
//! `success: false`.

use std::time::Instant;

use pagedistill_client::{DistillOptions, Extractor, StructuredContent};
use pagedistill_core::Error;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{LinkParams, Method, json_result, parse_page_url};
use crate::state::{PageSource, ServerState};

/// Input parameters for extract_static and extract_dynamic tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UrlExtractParams {
    /// The page URL to load.
    pub url: String,

    #[serde(flatten)]
    pub links: LinkParams,
}

/// Output structure for extract_static and extract_dynamic tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlExtractOutput {
    pub source_url: String,
    pub extracted_urls: Vec<String>,
    pub total_links_found: usize,
    /// Wall-clock seconds spent on the call.
    pub processing_time: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub method: Method,
    pub html_content: Option<String>,
    pub text_content: Option<String>,
    pub structured_content: Option<StructuredContent>,
}

impl UrlExtractOutput {
    fn failure(source_url: &Url, method: Method, start: Instant, err: Error) -> Self {
        tracing::warn!(url = %source_url, ?method, error = %err, "url extraction failed");
        Self {
            source_url: source_url.to_string(),
            extracted_urls: Vec::new(),
            total_links_found: 0,
            processing_time: start.elapsed().as_secs_f64(),
            success: false,
            error_message: Some(err.to_string()),
            method,
            html_content: None,
            text_content: None,
            structured_content: None,
        }
    }
}

/// Implementation of the extract_static tool.
pub async fn extract_static_impl(state: &ServerState, params: UrlExtractParams) -> Result<CallToolResult, McpError> {
    let url = parse_page_url(&params.url)?;
    let start = Instant::now();
    let options = DistillOptions {
        links: params.links.policy(state.config().static_exclude_file_types),
        ..Default::default()
    };

    let output = match state.fetch_page(&url).await {
        Ok(page) => summarize(state, &url, page, &options, true, start),
        Err(err) => UrlExtractOutput::failure(&url, Method::Fetch, start, err),
    };

    json_result(&output)
}

/// Implementation of the extract_dynamic tool.
pub async fn extract_dynamic_impl(state: &ServerState, params: UrlExtractParams) -> Result<CallToolResult, McpError> {
    let url = parse_page_url(&params.url)?;
    let start = Instant::now();
    let options = DistillOptions {
        links: params.links.policy(state.config().dynamic_exclude_file_types),
        ..Default::default()
    };

    let output = match state.render_page(&url).await {
        Ok(page) => summarize(state, &url, page, &options, false, start),
        Err(err) => UrlExtractOutput::failure(&url, Method::Render, start, err),
    };

    json_result(&output)
}

fn summarize(
    state: &ServerState, source_url: &Url, page: PageSource, options: &DistillOptions, with_structure: bool,
    start: Instant,
) -> UrlExtractOutput {
    let distilled = match state.distiller().extract(&page.html, &page.final_url, options) {
        Ok(distilled) => distilled,
        Err(err) => return UrlExtractOutput::failure(source_url, page.method, start, err),
    };

    tracing::info!(url = %source_url, method = ?page.method, urls = distilled.urls.len(), "urls extracted");

    UrlExtractOutput {
        source_url: source_url.to_string(),
        total_links_found: distilled.urls.len(),
        extracted_urls: distilled.urls,
        processing_time: start.elapsed().as_secs_f64(),
        success: true,
        error_message: None,
        method: page.method,
        html_content: Some(page.html),
        text_content: Some(distilled.text_content),
        structured_content: with_structure.then_some(distilled.structured),
    }
}
