//! distill_html tool implementation.
//!
//! Distills caller-supplied HTML. No network I/O is performed.

use pagedistill_client::{Distillation, Extractor, HeadingRecord, ImageRecord, StructuredContent, TableRecord};
use pagedistill_core::Error;
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{LinkParams, MarkdownParams, distill_options, json_result};
use crate::state::ServerState;

/// Base used when the caller gives none. Relative links cannot resolve against it.
const BLANK_BASE: &str = "about:blank";

/// Input parameters for distill_html tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DistillHtmlParams {
    /// The raw HTML content to distill.
    pub html: String,

    /// Absolute URL the HTML was served from (optional).
    /// Without it relative links are dropped from the URL list.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(flatten)]
    pub markdown: MarkdownParams,

    #[serde(flatten)]
    pub links: LinkParams,
}

/// Output structure for distill_html tool.
///
/// Unusable input yields `success: false` with every content field empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistillHtmlOutput {
    pub success: bool,
    pub error_message: Option<String>,
    pub markdown_content: String,
    pub title: String,
    pub description: String,
    pub headings: Vec<HeadingRecord>,
    pub images: Vec<ImageRecord>,
    pub tables: Vec<TableRecord>,
    pub extracted_urls: Vec<String>,
    pub total_links_found: usize,
    pub text_content: String,
    pub structured_content: StructuredContent,
}

impl From<Distillation> for DistillHtmlOutput {
    fn from(distilled: Distillation) -> Self {
        let result = distilled.result;
        Self {
            success: true,
            error_message: None,
            markdown_content: result.markdown,
            title: result.title,
            description: result.description,
            headings: result.headings,
            images: result.images,
            tables: result.tables,
            total_links_found: distilled.urls.len(),
            extracted_urls: distilled.urls,
            text_content: distilled.text_content,
            structured_content: distilled.structured,
        }
    }
}

impl DistillHtmlOutput {
    fn failure(err: Error) -> Self {
        tracing::warn!(error = %err, "html distillation failed");
        Self { success: false, error_message: Some(err.to_string()), ..Default::default() }
    }
}

/// Implementation of the distill_html tool.
pub async fn distill_html_impl(state: &ServerState, params: DistillHtmlParams) -> Result<CallToolResult, McpError> {
    let base_url = Url::parse(params.base_url.as_deref().unwrap_or(BLANK_BASE))
        .map_err(|e| Error::InvalidUrl(format!("base_url: {e}")))?;

    let policy = params.links.policy(state.config().static_exclude_file_types);
    let options = distill_options(&params.markdown, policy);
    let output = match state.distiller().extract(&params.html, &base_url, &options) {
        Ok(distilled) => DistillHtmlOutput::from(distilled),
        Err(err) => DistillHtmlOutput::failure(err),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagedistill_core::AppConfig;

    const TEST_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Test Article</title></head>
        <body>
            <nav><a href="/home">Home</a></nav>
            <article>
                <h1>Main Title</h1>
                <p>This is the article content with enough text to pass the main content threshold.</p>
                <p>A second paragraph keeps the article comfortably above one hundred characters.</p>
                <a href="/about">About Page</a>
                <a href="https://other.org/x">External Link</a>
            </article>
        </body>
        </html>
    "#;

    fn state() -> ServerState {
        ServerState::new(AppConfig::default()).unwrap()
    }

    fn params(html: &str, base_url: Option<&str>) -> DistillHtmlParams {
        DistillHtmlParams {
            html: html.into(),
            base_url: base_url.map(String::from),
            markdown: MarkdownParams::default(),
            links: LinkParams::default(),
        }
    }

    fn output(result: CallToolResult) -> DistillHtmlOutput {
        let text = result.content[0].as_text().unwrap().text.clone();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_distill_simple_article() {
        let result = distill_html_impl(&state(), params(TEST_HTML, Some("https://test.com/post"))).await.unwrap();
        assert!(!result.is_error.unwrap_or(false));

        let out = output(result);
        assert!(out.success);
        assert_eq!(out.error_message, None);
        assert_eq!(out.title, "Test Article");
        assert!(out.markdown_content.starts_with("# Main Title"));
        assert!(out.markdown_content.contains("[About Page](https://test.com/about)"));
        assert!(!out.markdown_content.contains("Home"));
        assert_eq!(out.extracted_urls, vec!["https://other.org/x", "https://test.com/about", "https://test.com/home"]);
        assert_eq!(out.total_links_found, 3);
    }

    #[tokio::test]
    async fn test_distill_without_base_drops_relative_links() {
        let out = output(distill_html_impl(&state(), params(TEST_HTML, None)).await.unwrap());
        assert_eq!(out.extracted_urls, vec!["https://other.org/x"]);
    }

    #[tokio::test]
    async fn test_distill_empty_html_is_failure_record() {
        for html in ["", "  \n\t"] {
            let out = output(distill_html_impl(&state(), params(html, None)).await.unwrap());
            assert!(!out.success);
            assert!(out.error_message.as_deref().is_some_and(|m| m.starts_with("EMPTY_DOCUMENT")));
            assert!(out.markdown_content.is_empty());
            assert!(out.extracted_urls.is_empty());
            assert_eq!(out.total_links_found, 0);
        }
    }

    #[tokio::test]
    async fn test_failure_record_json_shape() {
        let result = distill_html_impl(&state(), params("", Some("https://test.com/"))).await.unwrap();
        let text = result.content[0].as_text().unwrap().text.clone();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["success"], false);
        assert!(value["error_message"].is_string());
        assert_eq!(value["markdown_content"], "");
        assert_eq!(value["title"], "");
    }

    #[tokio::test]
    async fn test_distill_invalid_base_url_fails() {
        let result = distill_html_impl(&state(), params(TEST_HTML, Some("not a url"))).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_params_defaults_from_json() {
        let params: DistillHtmlParams = serde_json::from_str(r#"{"html": "<p>x</p>"}"#).unwrap();
        assert!(params.markdown.clean_html);
        assert!(params.markdown.include_images);
        assert!(params.links.include_external);
    }
}
