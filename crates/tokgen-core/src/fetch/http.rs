//! Token GET over libcurl.
//!
//! Each request is a blocking curl transfer run on the tokio blocking pool,
//! so a slow endpoint never stalls the worker threads.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use super::endpoint::{TokenEndpoint, TokenResponse};
use crate::batch::WorkItem;
use crate::retry::FetchError;

/// Issuance endpoint reached via `GET <base>?uid=<id>&password=<secret>`.
#[derive(Debug, Clone)]
pub struct CurlEndpoint {
    base: Url,
    connect_timeout: Duration,
}

impl CurlEndpoint {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid endpoint URL: {}", base_url))?;
        Ok(Self {
            base,
            connect_timeout: Duration::from_secs(10),
        })
    }

    /// Full request URL for one item (query parameters are percent-encoded).
    pub fn request_url(&self, item: &WorkItem) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("uid", &item.id)
            .append_pair("password", &item.secret);
        url
    }
}

impl TokenEndpoint for CurlEndpoint {
    async fn issue(&self, item: &WorkItem, timeout: Duration) -> Result<TokenResponse, FetchError> {
        let url = self.request_url(item);
        let connect_timeout = self.connect_timeout.min(timeout);
        let (code, body) =
            tokio::task::spawn_blocking(move || get(url.as_str(), connect_timeout, timeout))
                .await
                .map_err(|e| FetchError::Other(format!("request task failed: {}", e)))??;

        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}

/// Blocking GET; returns status code and body.
fn get(
    url: &str,
    connect_timeout: Duration,
    timeout: Duration,
) -> Result<(u32, Vec<u8>), FetchError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(connect_timeout)?;
    easy.timeout(timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    Ok((code, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_encodes_credentials() {
        let ep = CurlEndpoint::new("https://issuer.example/token").unwrap();
        let url = ep.request_url(&WorkItem::new("42", "p&ss word"));
        assert_eq!(
            url.as_str(),
            "https://issuer.example/token?uid=42&password=p%26ss+word"
        );
    }

    #[test]
    fn request_url_keeps_existing_query() {
        let ep = CurlEndpoint::new("https://issuer.example/token?v=2").unwrap();
        let url = ep.request_url(&WorkItem::new("1", "x"));
        assert_eq!(url.query(), Some("v=2&uid=1&password=x"));
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(CurlEndpoint::new("not a url").is_err());
    }
}
