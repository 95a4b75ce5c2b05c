//! Remote issuance endpoint abstraction.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::batch::WorkItem;
use crate::retry::FetchError;

/// Literal the endpoint returns in place of a token when issuance failed.
pub const NO_TOKEN_SENTINEL: &str = "N/A";

/// Decoded 2xx response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

/// Something that can exchange one credential pair for a token.
///
/// Implementations report every failure as a `FetchError`; a 2xx response is
/// returned as-is and the worker decides whether its token is usable.
pub trait TokenEndpoint: Send + Sync + 'static {
    fn issue(
        &self,
        item: &WorkItem,
        timeout: Duration,
    ) -> impl Future<Output = Result<TokenResponse, FetchError>> + Send;
}

/// Returns the token if present, non-empty and not the sentinel.
pub fn usable_token(resp: TokenResponse) -> Option<String> {
    resp.token
        .filter(|t| !t.is_empty() && t != NO_TOKEN_SENTINEL)
}
