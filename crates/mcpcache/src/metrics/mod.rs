//! Metrics module for the configuration cache.

pub mod cache;

pub use cache::{CacheMetrics, register_cache_metrics};
