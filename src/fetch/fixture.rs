//! In-memory fetcher serving canned JSON payloads, for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::value::RawValue;

use super::{DecodeTarget, Fetcher};
use crate::error::{FetchResult, RatefetchError, Result, StatusError};

/// On-disk layout accepted by [`StaticFetcher::from_json`].
#[derive(Debug, Deserialize)]
struct FixtureDocument {
    responses: HashMap<String, Box<RawValue>>,
}

/// Serves a fixed URL -> JSON mapping. Unknown URLs answer with status 404.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    /// Create a fetcher from raw JSON payloads keyed by URL.
    pub fn new(responses: HashMap<String, Vec<u8>>) -> Self {
        Self { responses }
    }

    /// Load fixtures from a document of the form `{"responses": {"<url>": <json>}}`.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let document: FixtureDocument = serde_json::from_slice(data)
            .map_err(|e| RatefetchError::Config(format!("Failed to parse fixtures: {}", e)))?;

        if document.responses.is_empty() {
            return Err(RatefetchError::Config("Fixture document has no responses".to_string()));
        }

        let responses = document
            .responses
            .into_iter()
            .map(|(url, raw)| (url, raw.get().as_bytes().to_vec()))
            .collect();
        Ok(Self { responses })
    }

    /// Add or replace the payload served for `url`.
    pub fn insert(&mut self, url: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.responses.insert(url.into(), payload.into());
    }

    /// Number of URLs with a canned response.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether no responses are configured.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get(&self, url: &str, target: &mut dyn DecodeTarget) -> FetchResult<()> {
        let payload = self
            .responses
            .get(url)
            .ok_or(StatusError { code: 404 })?;
        target.decode_json(payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::FetcherExt;

    #[test]
    fn test_from_json_loads_responses() {
        let fixtures = StaticFetcher::from_json(
            br#"{"responses": {"https://api.test/a": {"id": "a"}, "https://api.test/b": [1, 2]}}"#,
        )
        .unwrap();
        assert_eq!(fixtures.len(), 2);
    }

    #[test]
    fn test_from_json_rejects_empty_document() {
        let err = StaticFetcher::from_json(br#"{"responses": {}}"#).unwrap_err();
        assert!(matches!(err, RatefetchError::Config(_)));

        let err = StaticFetcher::from_json(b"[]").unwrap_err();
        assert!(matches!(err, RatefetchError::Config(_)));
    }

    #[tokio::test]
    async fn test_serves_canned_payload() {
        let fixtures = StaticFetcher::from_json(br#"{"responses": {"https://api.test/ids": [3, 1, 2]}}"#)
            .unwrap();
        let ids: Vec<u32> = fixtures.fetch("https://api.test/ids").await.unwrap();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_payloads_are_served_verbatim() {
        let fixtures = StaticFetcher::from_json(
            br#"{"responses": {"https://api.test/big": {"n":123456789012345678901234567890,"f":1.10}}}"#,
        )
        .unwrap();

        let raw: Box<RawValue> = fixtures.fetch("https://api.test/big").await.unwrap();
        assert_eq!(raw.get(), r#"{"n":123456789012345678901234567890,"f":1.10}"#);
    }

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let fixtures = StaticFetcher::default();
        assert!(fixtures.is_empty());

        let err = fixtures
            .fetch::<serde_json::Value>("https://api.test/nothing")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_bad_payload_is_decode_error() {
        let mut fixtures = StaticFetcher::default();
        fixtures.insert("https://api.test/broken", "not-json");

        let err = fixtures
            .fetch::<serde_json::Value>("https://api.test/broken")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
