use crate::util::UrlValidationError;
use thiserror::Error;

/// Coarse classification of an [`ApiError`].
///
/// Callers that only care whether the request failed or the reply was
/// unreadable can match on this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be built, sent, or was answered with a non-2xx status.
    Transport,
    /// The response arrived but its body was not the expected JSON object.
    Decode,
}

/// Errors returned by [`ApiClient`](super::ApiClient) and the datafeed operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL was rejected before any request was built.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),
    /// A path segment would be collapsed by URL normalization (`.` or `..`).
    #[error("Invalid path segment: {0:?}")]
    InvalidPathSegment(String),
    /// Request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    /// Network-level failure (DNS, connect, TLS, timeout set on the client)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Server answered with a non-2xx status.
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16, body: String },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response body is not a JSON object.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::InvalidBaseUrl(_)
            | ApiError::InvalidPathSegment(_)
            | ApiError::Encode(_)
            | ApiError::Network(_)
            | ApiError::HttpStatus { .. }
            | ApiError::ResponseTooLarge(_) => ErrorKind::Transport,
        }
    }

    /// HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
