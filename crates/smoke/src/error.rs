//! Error types for smoke checks

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Browser failed to start: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SmokeError {
    /// Wait timeouts are recovered by the check that hit them; everything
    /// else ends the run.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SmokeError::Timeout(_))
    }
}

pub type SmokeResult<T> = Result<T, SmokeError>;
