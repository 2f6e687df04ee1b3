//! Error types for the content-delivery client.
//!
//! # Design
//! Failures are sorted by where they happen. Bad caller input is an
//! `InvalidArgument` and is raised before any request is built. Anything that
//! goes wrong while fetching the space version is a `CacheRefresh`, so a
//! stale-cache problem never looks like a content problem. A single-story 404
//! is `NotFound`. Other failed statuses, on either fetch, are `Transport`
//! errors that keep the status code, which is absent only when no response
//! arrived.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the request builders, parsers and `ContentClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A caller-supplied input violates a contract: several story selectors,
    /// an empty attribute name, a sort spec with both field kinds, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The cache version could not be refreshed from the space endpoint.
    #[error("cache version refresh failed: {0}")]
    CacheRefresh(String),

    /// The server returned 404 for a single-story lookup.
    #[error("story not found")]
    NotFound,

    /// Non-2xx status (`status` is set) or a network failure (`status` is `None`).
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    /// The response body does not have the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The client configuration is incomplete or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => *status,
            ApiError::NotFound => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidArgument(msg.into())
    }
}
