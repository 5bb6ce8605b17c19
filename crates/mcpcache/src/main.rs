//! MCP configuration cache operator tool.
//!
//! ```text
//! mcpcache keygen                 print a new base64 encryption key
//! mcpcache check                  report cache configuration and backend health
//! mcpcache invalidate <id>...     drop cached configurations
//! ```
//!
//! Settings are read from the `CACHE_*` environment variables.

use anyhow::{Context, bail};
use mcpcache::{CacheSettings, ConfigCache, EncryptionKey};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: mcpcache <keygen | check | invalidate <id>...>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let command = args.next();

    match command.as_deref() {
        Some("keygen") => {
            println!("{}", EncryptionKey::generate().to_base64());
        },
        Some("check") => {
            let settings = CacheSettings::from_env().context("loading cache settings")?;
            tracing::debug!(?settings, "Loaded cache settings");

            mcpcache::metrics::register_cache_metrics();
            let cache = ConfigCache::init(&settings).await;
            let health = cache.health().await;
            cache.close().await;

            println!("{}", serde_json::to_string_pretty(&health)?);
        },
        Some("invalidate") => {
            let ids: Vec<String> = args.collect();
            if ids.is_empty() {
                bail!("{}", USAGE);
            }

            let settings = CacheSettings::from_env().context("loading cache settings")?;
            let cache = ConfigCache::init(&settings).await;
            if !cache.is_enabled() {
                tracing::warn!("Config cache is not enabled, nothing to invalidate");
            }

            let result = cache.invalidate_many(&ids).await;
            cache.close().await;

            tracing::info!(
                requested = ids.len(),
                removed = result.count,
                "Invalidation finished"
            );
            println!("Invalidated {} of {} entries", result.count, ids.len());
        },
        _ => bail!("{}", USAGE),
    }

    Ok(())
}
