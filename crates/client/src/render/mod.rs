//! Headless browser rendering for JS-heavy pages.
//!
//! This module provides the renderer trait used by the dynamic tools and,
//! behind the `render` feature, an implementation driving headless
//! Chrome/Chromium through chromiumoxide.

#[cfg(feature = "render")]
mod headless;

#[cfg(feature = "render")]
pub use headless::HeadlessRenderer;

use pagedistill_core::{AppConfig, Error};
use thiserror::Error;
use url::Url;

/// Errors that can occur during page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to launch or connect to browser.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// Failed to navigate to URL.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Failed to get page content.
    #[error("content retrieval failed: {0}")]
    ContentRetrieval(String),

    /// Timeout waiting for page to load.
    #[error("render timeout after {0}ms")]
    Timeout(u64),
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Error::RenderFailed(err.to_string())
    }
}

/// Options for rendering a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Navigation and load-wait budget in milliseconds (default: 30000).
    pub timeout_ms: u64,

    /// Also wait for jQuery to go idle and for `loadEventEnd` (default: true).
    pub wait_for_network_idle: bool,

    /// Fixed delay after loading for late scripts (default: 3000).
    pub settle_ms: u64,

    /// Scroll to the bottom and back to trigger lazy loading (default: true).
    pub scroll_for_lazy_content: bool,

    /// Inline same-origin iframe bodies into the captured HTML (default: true).
    pub stitch_iframes: bool,

    /// Viewport dimensions (default: 1920x1080).
    pub viewport: (u32, u32),
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            wait_for_network_idle: true,
            settle_ms: 3000,
            scroll_for_lazy_content: true,
            stitch_iframes: true,
            viewport: (1920, 1080),
        }
    }
}

impl From<&AppConfig> for RenderOptions {
    fn from(config: &AppConfig) -> Self {
        Self { timeout_ms: config.render_timeout_ms, settle_ms: config.render_settle_ms, ..Default::default() }
    }
}

/// Result of rendering a page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Rendered HTML content.
    pub html: String,

    /// Final URL after redirects.
    pub final_url: Url,
}

/// Renderer trait for headless browser page rendering.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Render a URL to HTML via headless browser.
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError>;
}
