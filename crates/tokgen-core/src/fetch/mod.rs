//! Token fetching: the endpoint seam, its curl implementation, and the
//! per-item worker that drives attempts through the backoff policy.

mod endpoint;
mod http;
#[cfg(test)]
pub(crate) mod mock;
mod worker;

pub use endpoint::{usable_token, TokenEndpoint, TokenResponse, NO_TOKEN_SENTINEL};
pub use http::CurlEndpoint;
pub use worker::{AttemptState, FetchWorker};
