use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use futures::future::join_all;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ratefetch::config::{FetcherConfig, RateLimitLayer};
use ratefetch::fetch::FetcherExt;

/// Fetch JSON documents from a quota-limited API without exceeding its rate limit.
#[derive(Debug, Parser)]
#[command(name = "ratefetch", version, about)]
struct Args {
    /// Path to a YAML fetcher configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Additional limit on requests started per window
    #[arg(long, requires = "window_ms")]
    limit: Option<usize>,

    /// Window length in milliseconds for --limit
    #[arg(long, requires = "limit")]
    window_ms: Option<u64>,

    /// URLs to fetch
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FetcherConfig::from_file(path)?,
        None => FetcherConfig::default(),
    };
    if let (Some(limit), Some(window_ms)) = (args.limit, args.window_ms) {
        config.rate_limits.push(RateLimitLayer::new(limit, Duration::from_millis(window_ms)));
    }

    let fetcher = config.build()?;
    info!(urls = args.urls.len(), "Fetching");

    let fetches = join_all(args.urls.iter().map(|url| {
        let fetcher = &fetcher;
        async move { (url, fetcher.fetch::<serde_json::Value>(url).await) }
    }));

    let results = tokio::select! {
        results = fetches => results,
        _ = shutdown_signal() => {
            anyhow::bail!("interrupted before all fetches completed");
        }
    };

    let mut failures = 0;
    for (url, result) in results {
        match result {
            Ok(document) => {
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            Err(e) => {
                failures += 1;
                error!(url = %url, error = %e, "Fetch failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} fetches failed", failures, args.urls.len());
    }
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, abandoning pending fetches");
        }
        _ = terminate => {
            info!("Received SIGTERM, abandoning pending fetches");
        }
    }
}
