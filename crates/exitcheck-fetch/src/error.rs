//! Fetch error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream returned error: {status} - {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Upstream list contained no valid addresses")]
    EmptyList,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
