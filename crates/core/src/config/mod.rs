//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGEDISTILL_*)
//! 2. TOML config file (if PAGEDISTILL_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Only process-wide settings live here. Per-request switches such as
//! `include_images` or `max_links` travel with each call.

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGEDISTILL_*)
/// 2. TOML config file (if PAGEDISTILL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via PAGEDISTILL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via PAGEDISTILL_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PAGEDISTILL_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects a fetch follows.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Whether rendered mode (headless browser) is enabled.
    ///
    /// Set via PAGEDISTILL_RENDER_ENABLED environment variable.
    #[serde(default)]
    pub render_enabled: bool,

    /// Page-load timeout for rendered mode in milliseconds.
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Extra delay after load before the DOM is captured, in milliseconds.
    #[serde(default = "default_render_settle_ms")]
    pub render_settle_ms: u64,

    /// Drop non-content file links (pdf, images, archives...) from fetched pages.
    #[serde(default)]
    pub static_exclude_file_types: bool,

    /// Drop non-content file links from rendered pages.
    #[serde(default = "default_true")]
    pub dynamic_exclude_file_types: bool,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_render_timeout_ms() -> u64 {
    30_000
}

fn default_render_settle_ms() -> u64 {
    3_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            render_enabled: false,
            render_timeout_ms: default_render_timeout_ms(),
            render_settle_ms: default_render_settle_ms(),
            static_exclude_file_types: false,
            dynamic_exclude_file_types: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGEDISTILL_`
    /// 2. TOML file from `PAGEDISTILL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGEDISTILL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("PAGEDISTILL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }
}
