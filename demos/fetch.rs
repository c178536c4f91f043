//! Fetches a URL twice through an on-disk cache.
//!
//! Usage:
//!   cargo run --example fetch -- http://127.0.0.1:8080/users/x
//!
//! Environment variables:
//!   ETAGCACHE_DIR    - cache directory (default: ./.etagcache)
//!   ETAGCACHE_CONFIG - optional JSON configuration file
//!   RUST_LOG         - log filter (default: info,etagcache=debug)

use etagcache::{
    CacheConfig, CachingTransport, FileStorage, LoggingTransport, Request, TcpTransport, Transport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,etagcache=debug")),
        )
        .init();

    let url: url::Url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080/".to_string())
        .parse()?;
    let dir = std::env::var("ETAGCACHE_DIR").unwrap_or_else(|_| ".etagcache".to_string());
    let config = match std::env::var("ETAGCACHE_CONFIG") {
        Ok(path) => CacheConfig::from_file(path)?,
        Err(_) => CacheConfig::default(),
    };

    let storage = FileStorage::open(dir).await?;
    let transport = LoggingTransport::new(CachingTransport::with_config(
        storage,
        TcpTransport::new(),
        config,
    )?);

    for attempt in 1..=2 {
        let request = Request::get(url.clone()).header("Accept", "application/json");
        let response = transport.round_trip(request).await?;
        let cached = response.headers().get("X-Cached-Request-Id").map(str::to_owned);
        let body = response.bytes().await?;
        tracing::info!(attempt, bytes = body.len(), ?cached, "fetched");
    }
    Ok(())
}
