//! Fetch error type for retry classification.

use std::fmt;

/// Transport-level failure category, as reported by the HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The request did not finish within the per-request timeout.
    TimedOut,
    /// DNS, connect, send or receive failure.
    Connection,
    /// Any other client-side failure (bad URL, TLS setup, ...).
    Other,
}

/// Error returned by a single token request.
/// Kept separate from `ErrorKind` so the raw cause survives for the detail string.
#[derive(Debug)]
pub enum FetchError {
    /// HTTP client reported a failure before a status was available.
    Transport {
        failure: TransportFailure,
        message: String,
    },
    /// Response had a non-2xx status.
    Http(u32),
    /// 2xx response whose body was not the expected JSON.
    Decode(serde_json::Error),
    /// 2xx response without a usable token.
    EmptyToken,
    /// Failure outside the request itself (e.g. the blocking task died).
    Other(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { message, .. } => write!(f, "{}", message),
            FetchError::Http(code) => write!(f, "HTTP {}", code),
            FetchError::Decode(e) => write!(f, "invalid response body: {}", e),
            FetchError::EmptyToken => write!(f, "response carried no token"),
            FetchError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Transport {
            failure: super::classify::curl_failure(&e),
            message: e.to_string(),
        }
    }
}
