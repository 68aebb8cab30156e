//! HTML distillation pipeline.
//!
//! ### Stages
//! - Parse once into an owned [`dom::Document`].
//! - Markdown: [`sanitize`] a copy, [`locate`] the main content, [`markdown`] renders it.
//!   With `clean_html` off the whole document is rendered untouched.
//! - [`metadata`] reads the unsanitized tree.
//! - [`links`] extracts classified URLs from the unsanitized tree.
//! - [`text`] builds the plain-text and structured views.
//!
//! ### Stable Abstraction
//! - Uses the `Extractor` trait for loose coupling between tools and the extraction engine.
//!
//! Every stage degrades to empty output instead of failing. The only error is
//! an input with no markup at all.

pub mod dom;
pub mod links;
pub mod locate;
pub mod markdown;
pub mod metadata;
pub mod sanitize;
pub mod text;

pub use dom::{Child, Document, Node};
pub use links::{LinkPolicy, LinkRecord, LinkScope, NON_CONTENT_EXTENSIONS, extract_links, extract_urls};
pub use locate::{ContentSelector, MAIN_CONTENT_SELECTORS, locate_main_content};
pub use markdown::{MarkdownOptions, clean_markdown, render_markdown};
pub use metadata::{HeadingRecord, ImageRecord, PageMetadata, TableRecord, extract_metadata};
pub use sanitize::{RemovalPolicy, sanitize};
pub use text::{StructuredContent, extract_structured_content, extract_text_content};

use pagedistill_core::Error;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use url::Url;

/// Request-scoped distillation switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistillOptions {
    /// Render `<img>` as Markdown images.
    pub include_images: bool,
    /// Render `<table>` as Markdown tables.
    pub include_tables: bool,
    /// Run the sanitizer and main-content locator before rendering.
    pub clean_html: bool,
    /// URL classification rules.
    pub links: LinkPolicy,
}

impl Default for DistillOptions {
    fn default() -> Self {
        Self { include_images: true, include_tables: true, clean_html: true, links: LinkPolicy::default() }
    }
}

impl DistillOptions {
    fn markdown_options(&self) -> MarkdownOptions {
        MarkdownOptions { include_images: self.include_images, include_tables: self.include_tables }
    }
}

/// Markdown plus page metadata for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub markdown: String,
    pub title: String,
    pub description: String,
    pub headings: Vec<HeadingRecord>,
    pub images: Vec<ImageRecord>,
    pub tables: Vec<TableRecord>,
}

impl ExtractionResult {
    fn new(markdown: String, metadata: PageMetadata) -> Self {
        Self {
            markdown,
            title: metadata.title,
            description: metadata.description,
            headings: metadata.headings,
            images: metadata.images,
            tables: metadata.tables,
        }
    }
}

/// Everything one distillation call produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distillation {
    pub result: ExtractionResult,
    /// Deduplicated, classified URLs.
    pub urls: Vec<String>,
    /// Plain text of the main content.
    pub text_content: String,
    pub structured: StructuredContent,
}

/// Stable extractor trait for content extraction.
///
/// This allows swapping the extraction engine later without changing tool code.
pub trait Extractor: Send + Sync {
    /// Distill raw HTML, resolving relative references against `base_url`.
    fn extract(&self, html: &str, base_url: &Url, options: &DistillOptions) -> Result<Distillation, Error>;
}

/// The built-in distiller.
#[derive(Debug, Clone, Copy)]
pub struct Distiller {
    policy: &'static RemovalPolicy,
}

impl Distiller {
    pub fn new() -> Self {
        Self { policy: &RemovalPolicy::DEFAULT }
    }

    fn render(&self, document: &Document, base_url: &Url, options: &DistillOptions) -> String {
        let markdown_options = options.markdown_options();

        if !options.clean_html {
            return render_markdown(document.root(), Some(base_url), &markdown_options);
        }

        let mut tree = document.root().clone();
        sanitize(&mut tree, self.policy);
        render_markdown(locate_main_content(&tree), Some(base_url), &markdown_options)
    }
}

impl Default for Distiller {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for Distiller {
    fn extract(&self, html: &str, base_url: &Url, options: &DistillOptions) -> Result<Distillation, Error> {
        if html.trim().is_empty() {
            return Err(Error::EmptyDocument("html cannot be empty".into()));
        }

        let start = Instant::now();
        let document = Document::parse(html);

        let markdown = self.render(&document, base_url, options);
        let metadata = extract_metadata(document.root());
        let urls = extract_urls(document.root(), base_url, &options.links);
        let text_content = extract_text_content(document.root(), self.policy);
        let structured = extract_structured_content(document.root(), Some(base_url), text_content.clone());

        tracing::debug!(
            base_url = %base_url,
            markdown_chars = markdown.len(),
            urls = urls.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "distilled document"
        );

        Ok(Distillation { result: ExtractionResult::new(markdown, metadata), urls, text_content, structured })
    }
}

/// Distill HTML with the default distiller.
pub fn distill(html: &str, base_url: &Url, options: &DistillOptions) -> Result<Distillation, Error> {
    Distiller::new().extract(html, base_url, options)
}
