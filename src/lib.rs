//! Ratefetch - Rate-Limited JSON Retrieval
//!
//! This crate fetches JSON documents from quota-limited REST APIs and decodes
//! them into caller-owned types. An unconditional [`HttpFetcher`] performs the
//! HTTP exchange; a [`RateLimitedFetcher`] wraps any fetcher so that no more
//! than a fixed number of requests start within a sliding time window.

pub mod config;
pub mod error;
pub mod fetch;
pub mod ratelimit;

pub use config::{FetcherConfig, HttpConfig, RateLimitLayer};
pub use error::{FetchError, FetchResult, RatefetchError, StatusError};
pub use fetch::{DecodeTarget, Fetcher, FetcherExt, HttpFetcher};
#[cfg(feature = "fixtures")]
pub use fetch::StaticFetcher;
pub use ratelimit::{RateLimitedFetcher, WindowLimiter};
