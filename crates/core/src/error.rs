//! Unified error types for pagedistill.
//!
//! Display strings carry a stable `CODE:` prefix so failures stay greppable
//! once they are flattened into `error_message` fields.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the distillation service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The document had no usable content to distill.
    #[error("EMPTY_DOCUMENT: {0}")]
    EmptyDocument(String),

    /// Fetch timed out.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Failed HTTP exchange or HTTP client construction.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Render mode is disabled.
    #[error("RENDER_DISABLED")]
    RenderDisabled,

    /// Render failed.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::EmptyDocument(msg) => (-32000, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::FetchTooLarge(msg) => (-32007, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::RenderDisabled => (-32011, "Render mode is disabled".to_string()),
            Error::RenderFailed(msg) => (-32012, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
