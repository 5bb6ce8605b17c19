//! Cache module for remote MCP server configurations.
//!
//! This module provides the cache-aside layer in front of the configuration
//! data source: encrypted values in a shared store, TTL-based expiration,
//! fallback to the data source on any cache failure, explicit invalidation
//! and per-key coalescing of concurrent misses.

pub mod availability;
pub mod config_cache;
pub mod flight;
pub mod invalidation;
pub mod keys;

// Re-exports
pub use availability::Availability;
pub use config_cache::{CacheHealth, ConfigCache, ConfigCacheBuilder};
pub use invalidation::InvalidationResult;
pub use keys::{CacheKey, DEFAULT_KEY_PREFIX};
