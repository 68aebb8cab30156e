//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` or `render_timeout_ms` is under 100ms or over 5 minutes
    /// - `render_settle_ms` exceeds `render_timeout_ms`
    /// - `max_redirects` exceeds 20
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        validate_timeout("timeout_ms", self.timeout_ms)?;
        validate_timeout("render_timeout_ms", self.render_timeout_ms)?;

        if self.render_settle_ms > self.render_timeout_ms {
            return Err(ConfigError::Invalid {
                field: "render_settle_ms".into(),
                reason: "must not exceed render_timeout_ms".into(),
            });
        }

        if self.max_redirects > 20 {
            return Err(ConfigError::Invalid { field: "max_redirects".into(), reason: "must not exceed 20".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.render_enabled && self.render_timeout_ms != AppConfig::default().render_timeout_ms {
            tracing::warn!(
                render_timeout_ms = self.render_timeout_ms,
                "render_timeout_ms is set but render_enabled is false; rendered extraction is unavailable"
            );
        }

        Ok(())
    }
}

fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
    }
    if value > 300_000 {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must not exceed 5 minutes (300000ms)".into() });
    }
    Ok(())
}
