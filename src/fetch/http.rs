//! Unconditional HTTP fetcher.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, trace};

use super::{DecodeTarget, Fetcher};
use crate::config::HttpConfig;
use crate::error::{FetchResult, RatefetchError, Result, StatusError};

/// Performs one HTTP GET per call and decodes the body as JSON.
///
/// No rate control and no retries: wrap it in a
/// [`RateLimitedFetcher`](crate::ratelimit::RateLimitedFetcher) to respect a quota.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default HTTP settings.
    pub fn new() -> Result<Self> {
        Self::from_config(&HttpConfig::default())
    }

    /// Create a fetcher using the timeouts from `config`.
    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(RatefetchError::Client)?;
        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Statuses that cannot carry a document: every error code, and 204.
fn is_rejected(status: StatusCode) -> bool {
    status.as_u16() >= 400 || status == StatusCode::NO_CONTENT
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self, target))]
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if is_rejected(status) {
            debug!(status = status.as_u16(), "Rejecting response status");
            return Err(StatusError { code: status.as_u16() }.into());
        }

        // The response is consumed here, releasing the connection on every path.
        let body = response.bytes().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "Decoding response body");

        target.decode_json(&body)?;
        Ok(())
    }
}
