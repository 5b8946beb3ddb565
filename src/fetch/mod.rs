//! JSON retrieval by URL.
//!
//! [`Fetcher`] is the single capability every retrieval strategy implements:
//! the unconditional [`HttpFetcher`], the rate-limiting decorator in
//! [`crate::ratelimit`], and (for tests) the in-memory `StaticFetcher`.
//! Callers and decorators are written against the trait, never a concrete type.

mod http;
#[cfg(any(test, feature = "fixtures"))]
mod fixture;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::{DeserializeOwned, Error as _};

use crate::error::{FetchError, FetchResult};

pub use http::HttpFetcher;
#[cfg(any(test, feature = "fixtures"))]
pub use fixture::StaticFetcher;

/// A caller-owned value that can be populated from a JSON document.
///
/// Every `DeserializeOwned + Send` type is a decode target. After a failed
/// decode the target's contents are unspecified.
pub trait DecodeTarget: Send {
    /// Replace the contents of `self` with the JSON document in `body`.
    fn decode_json(&mut self, body: &[u8]) -> serde_json::Result<()>;
}

impl<T> DecodeTarget for T
where
    T: DeserializeOwned + Send,
{
    fn decode_json(&mut self, body: &[u8]) -> serde_json::Result<()> {
        *self = serde_json::from_slice(body)?;
        Ok(())
    }
}

/// Retrieval capability: fetch the JSON document at `url` into `target`.
///
/// A call is a single attempt. Nothing is cached and nothing is retried; on
/// error the call must be treated as if it had not happened.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Populate `target` from the JSON document served at `url`.
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()>;
}

#[async_trait]
impl<F> Fetcher for Arc<F>
where
    F: Fetcher + ?Sized,
{
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()> {
        (**self).get(url, target).await
    }
}

#[async_trait]
impl<F> Fetcher for Box<F>
where
    F: Fetcher + ?Sized,
{
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()> {
        (**self).get(url, target).await
    }
}

/// Holds the value decoded by [`FetcherExt::fetch`].
struct Slot<T>(Option<T>);

impl<T> DecodeTarget for Slot<T>
where
    T: DeserializeOwned + Send,
{
    fn decode_json(&mut self, body: &[u8]) -> serde_json::Result<()> {
        self.0 = Some(serde_json::from_slice(body)?);
        Ok(())
    }
}

/// Convenience methods available on every [`Fetcher`].
pub trait FetcherExt: Fetcher {
    /// Fetch the document at `url` and return it as an owned value.
    fn fetch<'a, T>(&'a self, url: &'a str) -> BoxFuture<'a, FetchResult<T>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        Box::pin(async move {
            let mut slot = Slot(None);
            self.get(url, &mut slot).await?;
            slot.0.ok_or_else(|| {
                FetchError::Decode(serde_json::Error::custom(
                    "fetcher reported success without decoding a document",
                ))
            })
        })
    }
}

impl<F: Fetcher + ?Sized> FetcherExt for F {}
