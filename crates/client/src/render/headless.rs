//! Headless Chrome/Chromium renderer.
//!
//! One browser process is shared; each render call opens its own page and
//! closes it before returning, whatever the outcome.

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use futures_util::StreamExt;
use url::Url;

use super::{RenderError, RenderOptions, RenderedPage, Renderer};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SCROLL_PAUSE: Duration = Duration::from_secs(1);

const READY_STATE: &str = "document.readyState === 'complete'";
const JQUERY_IDLE: &str = "typeof jQuery === 'undefined' || jQuery.active === 0";
const LOAD_EVENT_END: &str = "window.performance.timing.loadEventEnd > 0";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight); true";
const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0); true";

/// Serializes the document with each same-origin iframe replaced by a `<div>`
/// holding that frame's body. Cross-origin frames are left as they are.
const STITCHED_HTML: &str = r#"(() => {
    const live = Array.from(document.querySelectorAll('iframe'));
    const root = document.documentElement.cloneNode(true);
    const copies = Array.from(root.querySelectorAll('iframe'));
    live.forEach((frame, i) => {
        let body = null;
        try { body = frame.contentDocument && frame.contentDocument.body; } catch (e) {}
        if (!body || !copies[i]) return;
        const stitched = document.createElement('div');
        stitched.setAttribute('data-iframe-src', frame.src || '');
        stitched.innerHTML = body.innerHTML;
        copies[i].replaceWith(stitched);
    });
    return '<!DOCTYPE html>' + root.outerHTML;
})()"#;

/// Headless Chrome/Chromium renderer using chromiumoxide.
pub struct HeadlessRenderer {
    browser: Browser,
}

impl HeadlessRenderer {
    /// Create a new headless renderer by launching a browser instance.
    ///
    /// The browser runs in headless mode and uses a background task
    /// to handle Chrome DevTools Protocol events.
    pub async fn new(user_agent: &str) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(RenderError::BrowserLaunch)?;

        let (browser, mut handler) =
            Browser::launch(config).await.map_err(|e| RenderError::BrowserLaunch(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::info!("headless browser launched");

        Ok(Self { browser })
    }

    async fn capture(&self, page: &Page, url: &Url, opts: &RenderOptions) -> Result<(String, Url), RenderError> {
        let budget = Duration::from_millis(opts.timeout_ms);
        let (width, height) = opts.viewport;

        if let Err(e) = page.execute(SetDeviceMetricsOverrideParams::new(width, height, 1.0, false)).await {
            tracing::debug!("viewport override failed: {e}");
        }

        tokio::time::timeout(budget, page.goto(url.as_str()))
            .await
            .map_err(|_| RenderError::Timeout(opts.timeout_ms))?
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        if !poll_until(page, READY_STATE, budget).await {
            tracing::warn!(%url, "page load timeout, proceeding with current content");
        }

        if opts.wait_for_network_idle {
            if !poll_until(page, JQUERY_IDLE, budget).await {
                tracing::debug!(%url, "jQuery still active");
            }
            if !poll_until(page, LOAD_EVENT_END, budget).await {
                tracing::debug!(%url, "loadEventEnd not reached");
            }
        }

        tokio::time::sleep(Duration::from_millis(opts.settle_ms)).await;

        if opts.scroll_for_lazy_content {
            for script in [SCROLL_TO_BOTTOM, SCROLL_TO_TOP] {
                if let Err(e) = page.evaluate(script).await {
                    tracing::debug!("error during scroll: {e}");
                    break;
                }
                tokio::time::sleep(SCROLL_PAUSE).await;
            }
        }

        let html = if opts.stitch_iframes {
            page.evaluate(STITCHED_HTML)
                .await
                .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
                .into_value::<String>()
                .map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
        } else {
            page.content().await.map_err(|e| RenderError::ContentRetrieval(e.to_string()))?
        };

        let page_url = page.url().await.map_err(|e| RenderError::ContentRetrieval(e.to_string()))?;
        let final_url = match page_url.as_deref().map(Url::parse) {
            Some(Ok(parsed)) => parsed,
            _ => url.clone(),
        };

        Ok((html, final_url))
    }
}

#[async_trait::async_trait]
impl Renderer for HeadlessRenderer {
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
        let start = Instant::now();
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let captured = self.capture(&page, url, opts).await;

        if let Err(e) = page.close().await {
            tracing::debug!("failed to close page: {e}");
        }

        let (html, final_url) = captured?;

        tracing::debug!(
            "rendered {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            start.elapsed().as_millis(),
            html.len()
        );

        Ok(RenderedPage { html, final_url })
    }
}

/// Poll a boolean expression until it holds or `budget` runs out.
async fn poll_until(page: &Page, expression: &str, budget: Duration) -> bool {
    let deadline = Instant::now() + budget;
    loop {
        if let Ok(result) = page.evaluate(expression).await
            && result.into_value::<bool>().unwrap_or(false)
        {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
