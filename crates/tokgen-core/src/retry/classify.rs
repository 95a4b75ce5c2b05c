//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::{FetchError, TransportFailure};
use super::policy::ErrorKind;

/// Classify a non-2xx HTTP status code.
///
/// Statuses that are neither throttling nor server-side are treated as
/// transport-level rejections.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 => ErrorKind::RateLimited,
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::NetworkError,
    }
}

/// Map a curl error to a transport failure category.
pub fn curl_failure(e: &curl::Error) -> TransportFailure {
    if e.is_operation_timedout() {
        return TransportFailure::TimedOut;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_ssl_connect_error()
    {
        return TransportFailure::Connection;
    }
    TransportFailure::Other
}

/// Classify a fetch error into an ErrorKind. Pure: same input, same kind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Transport { failure, .. } => match failure {
            TransportFailure::TimedOut => ErrorKind::Timeout,
            TransportFailure::Connection | TransportFailure::Other => ErrorKind::NetworkError,
        },
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::EmptyToken => ErrorKind::EmptyResult,
        FetchError::Decode(_) | FetchError::Other(_) => ErrorKind::UnknownError,
    }
}
