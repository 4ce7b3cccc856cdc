//! Single-shot HTTP download of the threat feed.

use anyhow::Result;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// URLhaus export of URLs added in the last 30 days.
pub const URLHAUS_RECENT: &str = "https://urlhaus.abuse.ch/downloads/csv_recent/";

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    /// No timeout unless set.
    pub timeout_ms: Option<u64>,
    /// Honour HTTP(S)_PROXY and friends from the environment.
    pub use_env_proxy: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            user_agent: format!("threatfeed/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: None,
            use_env_proxy: true,
        }
    }
}

fn build_client(opts: &FetchOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(opts.user_agent.clone())
        .gzip(true)
        .brotli(true)
        .deflate(true);
    if let Some(ms) = opts.timeout_ms {
        builder = builder.timeout(Duration::from_millis(ms));
    }
    if !opts.use_env_proxy {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

/// GET `url` once. Returns the body on 200 and `None` for any other status.
///
/// Transport failures (DNS, refused connections, TLS) are errors; a non-200
/// answer is not.
pub async fn fetch_feed(url: &str, opts: &FetchOptions) -> Result<Option<String>> {
    let target = Url::parse(url)?;
    let client = build_client(opts)?;
    tracing::info!(url = %target, "Fetching live threat data");
    let resp = client.get(target).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        tracing::warn!(status = status.as_u16(), "Failed to fetch data");
        return Ok(None);
    }
    let body = resp.text().await?;
    tracing::info!(bytes = body.len(), "Data downloaded successfully");
    Ok(Some(body))
}
