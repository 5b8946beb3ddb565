//! Rate-limiting decorator over any [`Fetcher`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use super::limiter::WindowLimiter;
use crate::error::{FetchResult, Result};
use crate::fetch::{DecodeTarget, Fetcher};

/// A [`Fetcher`] that starts at most `limit` requests per `window`.
///
/// Each call takes a slot from its [`WindowLimiter`] (waiting if none is
/// free), then delegates to the wrapped fetcher and returns its outcome
/// unchanged. Failed requests still consume their slot.
///
/// Limiters compose: wrapping a rate-limited fetcher in another one enforces
/// both quotas, so the stricter one dominates.
#[derive(Debug)]
pub struct RateLimitedFetcher<F> {
    inner: F,
    limiter: Arc<WindowLimiter>,
}

impl<F: Fetcher> RateLimitedFetcher<F> {
    /// Wrap `inner` with a new limiter allowing `limit` requests per `window`.
    pub fn new(inner: F, limit: usize, window: Duration) -> Result<Self> {
        Ok(Self::with_limiter(inner, Arc::new(WindowLimiter::new(limit, window)?)))
    }

    /// Wrap `inner` with an existing limiter, sharing its quota with every
    /// other fetcher built from the same limiter.
    pub fn with_limiter(inner: F, limiter: Arc<WindowLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// Get the limiter governing this fetcher.
    pub fn limiter(&self) -> &Arc<WindowLimiter> {
        &self.limiter
    }

    /// Get the wrapped fetcher.
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Unwrap into the inner fetcher.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RateLimitedFetcher<F> {
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()> {
        let acquired_at = self.limiter.acquire().await?;
        trace!(url = %url, acquired_at = ?acquired_at, "Dispatching rate limited request");

        self.inner.get(url, target).await
    }
}
