//! Client error types with numeric code mapping.
//!
//! [`ClientError`] is the central error type for the crate. Transport
//! failures raised by a page fetcher are carried as [`FetchError`] and
//! propagated verbatim; nothing in this crate retries them.

use crate::pagination::Relation;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Failure raised by a page fetch collaborator.
///
/// Covers transport, HTTP status and decoding failures. Timeouts are a
/// property of the underlying HTTP client and surface as [`FetchError::Http`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, timeout, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-success status.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The response body could not be decoded into page items.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A `Link` header or relation target could not be parsed.
    #[error("invalid link: {0}")]
    InvalidLink(String),

    /// The page descriptor could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns the HTTP-like status associated with this failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidLink(_) | Self::InvalidRequest(_) => None,
        }
    }
}

/// Crate-wide error enum.
///
/// # Error Codes
///
/// | Code  | Category                     | Status |
/// |-------|------------------------------|--------|
/// | 40000 | Invalid query parameter      | 400    |
/// | 40001 | Invalid interval identifier  | 400    |
/// | 40400 | Requested page does not exist| 404    |
/// | 50000 | Configuration                | 500    |
/// | 50002 | Fetch collaborator failure   | 5xx    |
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The requested relation is absent from the current page's links.
    #[error("no {relation} page available")]
    NoSuchPage {
        /// Relation that was requested.
        relation: Relation,
    },

    /// The fetch collaborator failed; propagated unchanged.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A query parameter has an invalid value.
    #[error("invalid parameter `{key}`: {reason}")]
    InvalidParam {
        /// Parameter key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A string is not a valid interval identifier for any granularity.
    #[error("invalid interval id: {0}")]
    InvalidIntervalId(String),

    /// Client configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Builds an [`ClientError::InvalidParam`] for `key`.
    pub fn invalid_param(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidParam { .. } => 40000,
            Self::InvalidIntervalId(_) => 40001,
            Self::NoSuchPage { .. } => 40400,
            Self::Config(_) => 50000,
            Self::Fetch(_) => 50002,
        }
    }

    /// Returns the HTTP-like status code for this variant.
    ///
    /// Fetch failures report the remote status when one is known.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidParam { .. } | Self::InvalidIntervalId(_) => 400,
            Self::NoSuchPage { .. } => 404,
            Self::Config(_) => 500,
            Self::Fetch(err) => err.status().unwrap_or(502),
        }
    }

    /// Returns `true` if this is a [`ClientError::NoSuchPage`].
    #[must_use]
    pub const fn is_no_such_page(&self) -> bool {
        matches!(self, Self::NoSuchPage { .. })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn no_such_page_maps_to_404() {
        let err = ClientError::NoSuchPage {
            relation: Relation::Next,
        };
        assert_eq!(err.error_code(), 40400);
        assert_eq!(err.status_code(), 404);
        assert!(err.is_no_such_page());
        assert_eq!(err.to_string(), "no next page available");
    }

    #[test]
    fn fetch_status_is_forwarded() {
        let err = ClientError::from(FetchError::Status {
            status: 401,
            message: "unauthorized".to_string(),
        });
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), 50002);
        assert!(!err.is_no_such_page());
    }

    #[test]
    fn fetch_without_status_defaults_to_502() {
        let err = ClientError::from(FetchError::InvalidLink("<bad".to_string()));
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn invalid_param_message() {
        let err = ClientError::invalid_param("limit", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter `limit`: must be positive");
        assert_eq!(err.status_code(), 400);
    }
}
