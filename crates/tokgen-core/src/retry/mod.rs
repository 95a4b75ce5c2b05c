//! Retry and backoff policy.
//!
//! This module encapsulates error classification (rate limiting, server
//! errors, timeouts, transport failures, empty responses) and the per-kind
//! backoff schedule so the fetch worker can stay a plain loop.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_http_status, curl_failure};
pub use error::{FetchError, TransportFailure};
pub use policy::{BackoffPolicy, ErrorKind, RetryDecision};
