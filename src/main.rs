//! `realtime-stats`: prints application statistics as JSON lines.
//!
//! Arguments are `key=value` query parameters (`direction`, `start`,
//! `end`, `limit`, `unit`). `pages=N` caps how many pages are followed.
//!
//! ```text
//! realtime-stats direction=forwards unit=hour start=2024-03-07:00 pages=3
//! ```

use std::sync::Arc;

use anyhow::Context;
use futures_util::StreamExt;
use tracing_subscriber::EnvFilter;

use realtime_sdk_core::config::ClientConfig;
use realtime_sdk_core::http::HttpPageFetcher;
use realtime_sdk_core::pagination::Param;
use realtime_sdk_core::stats::{self, Stats, StatsQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);
    if std::env::var("REALTIME_LOG_FORMAT").is_ok_and(|v| v == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    // Load configuration
    let config = ClientConfig::from_env().context("loading configuration")?;
    tracing::info!(host = %config.rest_host, "starting realtime-stats");

    let mut max_pages = usize::MAX;
    let mut params = Vec::new();
    for arg in std::env::args().skip(1) {
        let (key, value) = arg
            .split_once('=')
            .with_context(|| format!("argument `{arg}` is not key=value"))?;
        if key == "pages" {
            max_pages = value.parse().context("pages must be a positive integer")?;
        } else {
            params.push(Param::new(key, value));
        }
    }

    let mut query = StatsQuery::from_params(&params).context("invalid query")?;
    if query.limit.is_none() {
        query.limit = Some(config.stats_limit);
    }

    let fetcher = Arc::new(HttpPageFetcher::<Stats>::new(&config)?);
    let first = stats::stats(fetcher, &query).await?;

    let mut pages = Box::pin(first.into_stream().take(max_pages));
    let mut printed = 0usize;
    while let Some(page) = pages.next().await {
        let page = page?;
        for record in page.items() {
            println!("{}", serde_json::to_string(record)?);
            printed += 1;
        }
    }

    tracing::info!(records = printed, "done");
    Ok(())
}
