//! Crate-wide error type

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("build command '{command}' failed: {reason}")]
    Build { command: String, reason: String },

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to walk static directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid upstream URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("failed to build HTTP message: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream answered {0}")]
    UpstreamStatus(StatusCode),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("unexpected upstream payload: {0}")]
    Payload(String),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn build(command: &str, reason: impl Into<String>) -> Self {
        Self::Build {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}
