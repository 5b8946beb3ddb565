//! Error types for ratefetch.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// HTTP status code returned by servers that are over their request quota.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Error type for crate setup: configuration loading and fetcher construction.
#[derive(Error, Debug)]
pub enum RatefetchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for crate setup operations.
pub type Result<T> = std::result::Result<T, RatefetchError>;

/// A response was received, but its status cannot carry a JSON document.
///
/// Raised for every status `>= 400` and for `204 No Content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusError {
    /// The numeric HTTP status code.
    pub code: u16,
}

impl StatusError {
    /// Whether the server rejected the request for exceeding its quota.
    pub fn is_too_many_requests(&self) -> bool {
        self.code == TOO_MANY_REQUESTS
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_too_many_requests() {
            return f.write_str("too many requests to server");
        }
        write!(f, "non-success status {}", self.code)
    }
}

impl std::error::Error for StatusError {}

/// Failure of a single `Fetcher::get` call.
///
/// A failed call is a no-op attempt: the decode target holds nothing meaningful.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP exchange could not be completed (DNS, connect, timeout, bad URL).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The status code was outside the accepted range, or was 204.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// The body was not JSON or did not match the target's shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// No rate-limit slot became free within the configured acquisition timeout.
    #[error("no rate-limit slot available within {0:?}")]
    AcquireTimeout(Duration),
}

impl FetchError {
    /// The HTTP status code, if the failure came from a received response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status(e) => Some(e.code),
            _ => None,
        }
    }

    /// Whether the remote quota was exceeded despite local rate limiting.
    pub fn is_too_many_requests(&self) -> bool {
        matches!(self, FetchError::Status(e) if e.is_too_many_requests())
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_requests_message() {
        let err = StatusError { code: 429 };
        assert_eq!(err.to_string(), "too many requests to server");
        assert!(err.is_too_many_requests());
    }

    #[test]
    fn test_generic_status_message() {
        let err = StatusError { code: 404 };
        assert_eq!(err.to_string(), "non-success status 404");
        assert!(!err.is_too_many_requests());
    }

    #[test]
    fn test_fetch_error_is_transparent_over_status() {
        let err = FetchError::from(StatusError { code: 429 });
        assert_eq!(err.to_string(), "too many requests to server");
        assert_eq!(err.status_code(), Some(429));
        assert!(err.is_too_many_requests());
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let json_err = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let err = FetchError::from(json_err);
        assert!(err.to_string().starts_with("decode error:"));
        assert_eq!(err.status_code(), None);
        assert!(!err.is_too_many_requests());
    }
}
