//! Configuration management for ratefetch.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::{RatefetchError, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::ratelimit::RateLimitedFetcher;

/// Main configuration for a fetcher stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Rate limits to enforce, innermost first
    #[serde(default)]
    pub rate_limits: Vec<RateLimitLayer>,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection establishment timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl HttpConfig {
    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// One request quota: at most `limit` requests per `window_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitLayer {
    /// Maximum requests started within one window
    pub limit: usize,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Optional name/description for this limit
    #[serde(default)]
    pub name: Option<String>,
}

impl RateLimitLayer {
    /// Create an unnamed layer.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            name: None,
        }
    }

    /// Get the window duration.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl FetcherConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading fetcher configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: FetcherConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RatefetchError::Config(format!("Failed to parse fetcher config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value can be used to build a fetcher.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_ms == 0 {
            return Err(RatefetchError::Config("http.timeout_ms must be non-zero".to_string()));
        }
        if self.http.connect_timeout_ms == 0 {
            return Err(RatefetchError::Config(
                "http.connect_timeout_ms must be non-zero".to_string(),
            ));
        }

        for (index, layer) in self.rate_limits.iter().enumerate() {
            let label = layer.name.clone().unwrap_or_else(|| format!("#{}", index));
            if layer.limit == 0 {
                return Err(RatefetchError::Config(format!(
                    "rate limit {}: limit must be at least 1",
                    label
                )));
            }
            if layer.window_ms == 0 {
                return Err(RatefetchError::Config(format!(
                    "rate limit {}: window_ms must be non-zero",
                    label
                )));
            }
        }
        Ok(())
    }

    /// Build the configured fetcher: an [`HttpFetcher`] wrapped by one
    /// [`RateLimitedFetcher`] per rate limit layer.
    pub fn build(&self) -> Result<Arc<dyn Fetcher>> {
        self.validate()?;

        let mut fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::from_config(&self.http)?);
        for layer in &self.rate_limits {
            info!(
                name = layer.name.as_deref().unwrap_or("unnamed"),
                limit = layer.limit,
                window_ms = layer.window_ms,
                "Adding rate limit"
            );
            fetcher = Arc::new(RateLimitedFetcher::new(fetcher, layer.limit, layer.window())?);
        }
        Ok(fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetcherConfig::default();
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(5));
        assert!(config.rate_limits.is_empty());
    }

    #[test]
    fn test_parse_layered_limits() {
        let yaml = r#"
http:
  timeout_ms: 2500
rate_limits:
  - limit: 10
    window_ms: 10000
    name: short
  - limit: 500
    window_ms: 600000
    name: long
"#;
        let config = FetcherConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.http.timeout_ms, 2500);
        assert_eq!(config.http.connect_timeout_ms, 5000);
        assert_eq!(config.rate_limits.len(), 2);
        assert_eq!(config.rate_limits[0].limit, 10);
        assert_eq!(config.rate_limits[0].window(), Duration::from_secs(10));
        assert_eq!(config.rate_limits[1].name.as_deref(), Some("long"));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = FetcherConfig::from_yaml("{}").unwrap();
        assert_eq!(config.http.timeout_ms, 10_000);
        assert!(config.rate_limits.is_empty());
    }

    #[test]
    fn test_rejects_zero_limit() {
        let yaml = r#"
rate_limits:
  - limit: 0
    window_ms: 1000
    name: broken
"#;
        let err = FetcherConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_rejects_zero_window() {
        let config = FetcherConfig {
            http: HttpConfig::default(),
            rate_limits: vec![RateLimitLayer::new(5, Duration::ZERO)],
        };
        assert!(matches!(config.validate(), Err(RatefetchError::Config(_))));
    }

    #[test]
    fn test_layer_window_saturates() {
        let layer = RateLimitLayer::new(1, Duration::MAX);
        assert_eq!(layer.window_ms, u64::MAX);

        let layer = RateLimitLayer::new(1, Duration::from_millis(1500));
        assert_eq!(layer.window_ms, 1500);
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let err = FetcherConfig::from_yaml("rate_limits: [limit").unwrap_err();
        assert!(matches!(err, RatefetchError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FetcherConfig::from_file("/nonexistent/ratefetch.yaml").unwrap_err();
        assert!(matches!(err, RatefetchError::Io(_)));
    }

    #[tokio::test]
    async fn test_build_layers() {
        let config = FetcherConfig {
            http: HttpConfig::default(),
            rate_limits: vec![
                RateLimitLayer::new(10, Duration::from_secs(10)),
                RateLimitLayer::new(500, Duration::from_secs(600)),
            ],
        };
        assert!(config.build().is_ok());
    }
}
