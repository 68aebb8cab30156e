//! Shared server state.
//!
//! The fetch client is built once at startup. The headless browser is only
//! launched on the first call that needs it and then reused.

use std::sync::Arc;

use pagedistill_client::{Distiller, FetchClient, FetchConfig, RenderOptions, Renderer};
use pagedistill_core::{AppConfig, Error};
use tokio::sync::OnceCell;
use url::Url;

use crate::tools::Method;

/// HTML obtained from the network.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub html: String,
    /// Base for resolving relative references.
    pub final_url: Url,
    pub method: Method,
}

pub struct ServerState {
    config: AppConfig,
    fetch: FetchClient,
    renderer: OnceCell<Arc<dyn Renderer>>,
    distiller: Distiller,
}

impl ServerState {
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let fetch = FetchClient::new(FetchConfig::from(&config))?;
        Ok(Self { config, fetch, renderer: OnceCell::new(), distiller: Distiller::new() })
    }

    /// State with a pre-built renderer, bypassing browser launch.
    pub fn with_renderer(config: AppConfig, renderer: Arc<dyn Renderer>) -> Result<Self, Error> {
        let fetch = FetchClient::new(FetchConfig::from(&config))?;
        Ok(Self { config, fetch, renderer: OnceCell::from(renderer), distiller: Distiller::new() })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn distiller(&self) -> &Distiller {
        &self.distiller
    }

    /// Whether a render call could be attempted.
    pub fn can_render(&self) -> bool {
        self.renderer.initialized() || (cfg!(feature = "render") && self.config.render_enabled)
    }

    /// Fetch a page over plain HTTP.
    pub async fn fetch_page(&self, url: &Url) -> Result<PageSource, Error> {
        let response = self.fetch.fetch(url.as_str()).await?;
        Ok(PageSource { html: response.text(), final_url: response.final_url, method: Method::Fetch })
    }

    /// Render a page in the headless browser.
    pub async fn render_page(&self, url: &Url) -> Result<PageSource, Error> {
        let renderer = self.renderer().await?;
        let page = renderer.render(url, &RenderOptions::from(&self.config)).await?;
        Ok(PageSource { html: page.html, final_url: page.final_url, method: Method::Render })
    }

    /// Render when possible, else fetch.
    pub async fn load_page(&self, url: &Url) -> Result<PageSource, Error> {
        if self.can_render() { self.render_page(url).await } else { self.fetch_page(url).await }
    }

    async fn renderer(&self) -> Result<Arc<dyn Renderer>, Error> {
        if let Some(renderer) = self.renderer.get() {
            return Ok(Arc::clone(renderer));
        }
        if !self.config.render_enabled {
            return Err(Error::RenderDisabled);
        }
        self.launch_renderer().await
    }

    #[cfg(feature = "render")]
    async fn launch_renderer(&self) -> Result<Arc<dyn Renderer>, Error> {
        use pagedistill_client::HeadlessRenderer;

        let user_agent = self.config.user_agent.clone();
        self.renderer
            .get_or_try_init(|| async move {
                let renderer = HeadlessRenderer::new(&user_agent).await?;
                Ok::<_, Error>(Arc::new(renderer) as Arc<dyn Renderer>)
            })
            .await
            .cloned()
    }

    #[cfg(not(feature = "render"))]
    async fn launch_renderer(&self) -> Result<Arc<dyn Renderer>, Error> {
        Err(Error::RenderDisabled)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pagedistill_client::{RenderError, RenderedPage};

    /// Renderer that serves fixed HTML for every URL.
    pub(crate) struct FixtureRenderer(pub &'static str);

    #[async_trait::async_trait]
    impl Renderer for FixtureRenderer {
        async fn render(&self, url: &Url, _opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
            Ok(RenderedPage { html: self.0.to_string(), final_url: url.clone() })
        }
    }

    /// Renderer that always fails.
    pub(crate) struct BrokenRenderer;

    #[async_trait::async_trait]
    impl Renderer for BrokenRenderer {
        async fn render(&self, _url: &Url, _opts: &RenderOptions) -> Result<RenderedPage, RenderError> {
            Err(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()))
        }
    }

    #[tokio::test]
    async fn test_render_disabled_by_default() {
        let state = ServerState::new(AppConfig::default()).unwrap();
        assert!(!state.can_render());

        let url = Url::parse("https://example.com").unwrap();
        let result = state.render_page(&url).await;
        assert!(matches!(result, Err(Error::RenderDisabled)));
    }

    #[tokio::test]
    async fn test_injected_renderer_is_used() {
        let state = ServerState::with_renderer(AppConfig::default(), Arc::new(FixtureRenderer("<p>hi</p>"))).unwrap();
        assert!(state.can_render());

        let url = Url::parse("https://example.com/page").unwrap();
        let page = state.load_page(&url).await.unwrap();
        assert_eq!(page.method, Method::Render);
        assert_eq!(page.html, "<p>hi</p>");
        assert_eq!(page.final_url, url);
    }

    #[tokio::test]
    async fn test_render_failure_maps_to_render_failed() {
        let state = ServerState::with_renderer(AppConfig::default(), Arc::new(BrokenRenderer)).unwrap();
        let url = Url::parse("https://example.com").unwrap();
        let result = state.render_page(&url).await;
        assert!(matches!(result, Err(Error::RenderFailed(_))));
    }
}
