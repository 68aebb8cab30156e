//! extract_markdown and extract_markdown_clean tool implementations.
//!
//! The page is rendered when a browser is available and fetched otherwise.
//! Both tools build the same record; the clean variant leaves out the raw
//! HTML, plain text and structured views.

use std::time::Instant;

use pagedistill_client::{Distillation, Extractor, HeadingRecord, ImageRecord, StructuredContent, TableRecord};
use pagedistill_core::Error;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{LinkParams, MarkdownParams, Method, distill_options, json_result, parse_page_url};
use crate::state::{PageSource, ServerState};

/// Input parameters for extract_markdown and extract_markdown_clean tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarkdownExtractParams {
    /// The page URL to load.
    pub url: String,

    #[serde(flatten)]
    pub markdown: MarkdownParams,

    #[serde(flatten)]
    pub links: LinkParams,
}

/// Output structure for extract_markdown and extract_markdown_clean tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownExtractOutput {
    pub source_url: String,
    pub extracted_urls: Vec<String>,
    pub total_links_found: usize,
    /// Wall-clock seconds spent on the call.
    pub processing_time: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub method: Option<Method>,

    pub markdown_content: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub headings: Option<Vec<HeadingRecord>>,
    pub images: Option<Vec<ImageRecord>>,
    pub tables: Option<Vec<TableRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<StructuredContent>,
}

impl MarkdownExtractOutput {
    fn success(source_url: &Url, page: PageSource, distilled: Distillation, start: Instant) -> Self {
        let result = distilled.result;
        Self {
            source_url: source_url.to_string(),
            total_links_found: distilled.urls.len(),
            extracted_urls: distilled.urls,
            processing_time: start.elapsed().as_secs_f64(),
            success: true,
            error_message: None,
            method: Some(page.method),
            markdown_content: Some(result.markdown),
            title: Some(result.title),
            description: Some(result.description),
            headings: Some(result.headings),
            images: Some(result.images),
            tables: Some(result.tables),
            html_content: Some(page.html),
            text_content: Some(distilled.text_content),
            structured_content: Some(distilled.structured),
        }
    }

    fn failure(source_url: &Url, method: Method, start: Instant, err: Error) -> Self {
        tracing::warn!(url = %source_url, ?method, error = %err, "markdown extraction failed");
        Self {
            source_url: source_url.to_string(),
            processing_time: start.elapsed().as_secs_f64(),
            error_message: Some(err.to_string()),
            method: Some(method),
            ..Default::default()
        }
    }

    /// Drop the raw views.
    fn into_clean(self) -> Self {
        Self { html_content: None, text_content: None, structured_content: None, ..self }
    }
}

async fn build_output(state: &ServerState, params: MarkdownExtractParams) -> Result<MarkdownExtractOutput, Error> {
    let url = parse_page_url(&params.url)?;
    let start = Instant::now();
    let attempted = if state.can_render() { Method::Render } else { Method::Fetch };

    let page = match state.load_page(&url).await {
        Ok(page) => page,
        Err(err) => return Ok(MarkdownExtractOutput::failure(&url, attempted, start, err)),
    };

    let policy = params.links.policy(match page.method {
        Method::Fetch => state.config().static_exclude_file_types,
        Method::Render => state.config().dynamic_exclude_file_types,
    });
    let options = distill_options(&params.markdown, policy);

    let output = match state.distiller().extract(&page.html, &page.final_url, &options) {
        Ok(distilled) => MarkdownExtractOutput::success(&url, page, distilled, start),
        Err(err) => MarkdownExtractOutput::failure(&url, page.method, start, err),
    };

    tracing::info!(url = %url, success = output.success, links = output.total_links_found, "markdown extracted");

    Ok(output)
}

/// Implementation of the extract_markdown tool.
pub async fn extract_markdown_impl(
    state: &ServerState, params: MarkdownExtractParams,
) -> Result<CallToolResult, McpError> {
    let output = build_output(state, params).await?;
    json_result(&output)
}

/// Implementation of the extract_markdown_clean tool.
pub async fn extract_markdown_clean_impl(
    state: &ServerState, params: MarkdownExtractParams,
) -> Result<CallToolResult, McpError> {
    let output = build_output(state, params).await?;
    json_result(&output.into_clean())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{BrokenRenderer, FixtureRenderer};
    use pagedistill_core::AppConfig;
    use std::sync::Arc;

    const PAGE: &str = r#"
        <html>
        <head>
            <title>Quarterly Report</title>
            <meta name="description" content="Numbers for the third quarter of the year.">
        </head>
        <body>
            <div class="cookie-banner">We use cookies</div>
            <main>
                <h1>Results</h1>
                <p>Revenue grew steadily across every region this quarter, driven by new subscriptions.</p>
                <img src="/chart.png" alt="Chart">
                <table>
                    <thead><tr><th>Region</th><th>Growth</th></tr></thead>
                    <tbody><tr><td>EU</td><td>4%</td></tr><tr><td>US</td><td>6%</td></tr></tbody>
                </table>
                <a href="/q2">Previous quarter</a>
            </main>
        </body>
        </html>
    "#;

    fn params() -> MarkdownExtractParams {
        MarkdownExtractParams {
            url: "https://reports.example.com/q3".into(),
            markdown: MarkdownParams::default(),
            links: LinkParams::default(),
        }
    }

    fn state() -> ServerState {
        ServerState::with_renderer(AppConfig::default(), Arc::new(FixtureRenderer(PAGE))).unwrap()
    }

    fn json(result: CallToolResult) -> serde_json::Value {
        let text = result.content[0].as_text().unwrap().text.clone();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_extract_markdown_full_record() {
        let value = json(extract_markdown_impl(&state(), params()).await.unwrap());
        let out: MarkdownExtractOutput = serde_json::from_value(value).unwrap();

        assert!(out.success);
        assert_eq!(out.method, Some(Method::Render));
        assert_eq!(out.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(out.description.as_deref(), Some("Numbers for the third quarter of the year."));

        let markdown = out.markdown_content.unwrap();
        assert!(markdown.starts_with("# Results"));
        assert!(markdown.contains("![Chart](https://reports.example.com/chart.png)"));
        assert!(markdown.contains("| Region | Growth |\n| --- | --- |\n| EU | 4% |\n| US | 6% |"));
        assert!(!markdown.contains("cookies"));

        assert_eq!(out.tables.unwrap()[0].rows, 3);
        assert!(out.html_content.unwrap().contains("cookie-banner"));
        assert!(out.text_content.is_some());
        assert!(out.structured_content.is_some());
    }

    #[tokio::test]
    async fn test_extract_markdown_clean_omits_raw_views() {
        let value = json(extract_markdown_clean_impl(&state(), params()).await.unwrap());

        assert_eq!(value["success"], true);
        assert!(value.get("markdown_content").is_some());
        assert!(value.get("html_content").is_none());
        assert!(value.get("text_content").is_none());
        assert!(value.get("structured_content").is_none());
    }

    #[tokio::test]
    async fn test_extract_markdown_respects_flags() {
        let mut params = params();
        params.markdown.include_images = false;
        params.markdown.include_tables = false;

        let value = json(extract_markdown_impl(&state(), params).await.unwrap());
        let markdown = value["markdown_content"].as_str().unwrap();
        assert!(!markdown.contains("!["));
        assert!(!markdown.contains("| --- |"));
    }

    #[tokio::test]
    async fn test_extract_markdown_render_failure() {
        let state = ServerState::with_renderer(AppConfig::default(), Arc::new(BrokenRenderer)).unwrap();
        let out: MarkdownExtractOutput =
            serde_json::from_value(json(extract_markdown_impl(&state, params()).await.unwrap())).unwrap();

        assert!(!out.success);
        assert_eq!(out.method, Some(Method::Render));
        assert!(out.markdown_content.is_none());
        assert_eq!(out.total_links_found, 0);
    }

    #[tokio::test]
    async fn test_extract_markdown_bad_url() {
        let mut params = params();
        params.url = "   ".into();
        assert!(extract_markdown_impl(&state(), params).await.is_err());
    }
}
