//! MCP Cache - Encrypted cache for remote MCP server configurations
//!
//! The proxy resolves the server configurations of an owner through
//! [`ConfigCache::get`], passing the database lookup as the fetch function.
//! The cache never fails a lookup on its own: without a reachable backend
//! every call degrades to the fetch.

pub mod cache;
pub mod codec;
pub mod metrics;
pub mod settings;

pub use cache::{CacheHealth, CacheKey, ConfigCache, ConfigCacheBuilder, InvalidationResult};
pub use codec::{Codec, EncryptionKey};
pub use crate::metrics::CacheMetrics;
pub use settings::{CacheSettings, SettingsError};

// Re-export domain types and backends for consumers
pub use mcpcache_core::{CachedPayload, ConfigEntry, Namespace, RemoteServerConfig, ServerId};
pub use mcpcache_store as store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
