//! Cache store trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// A key-value store with per-entry expiry.
///
/// This trait abstracts over the cache backend (Redis, in-process memory)
/// so the configuration cache never depends on a concrete client. Values
/// are opaque strings; writes always replace the whole value.
///
/// # Implementors
///
/// - `RedisStore` - external Redis server, shared connection manager
/// - `MemoryStore` - in-process store backed by moka
/// - `NoopStore` - always misses, accepts and drops writes
///
/// # Example
///
/// ```ignore
/// use mcpcache_store::{CacheStore, StoreError};
///
/// struct MyStore;
///
/// #[async_trait]
/// impl CacheStore for MyStore {
///     async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
///         Ok(None)
///     }
///
///     async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
///         Ok(())
///     }
///
///     async fn delete(&self, key: &str) -> Result<bool, StoreError> {
///         Ok(false)
///     }
///
///     async fn health_check(&self) -> Result<(), StoreError> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "my-store"
///     }
/// }
/// ```
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The entry expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Removes the value stored under `key`.
    ///
    /// Returns `true` if an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Cheap liveness check without I/O.
    ///
    /// Returning `false` tells callers to skip the store entirely.
    fn is_available(&self) -> bool {
        true
    }

    /// Establishes the backend connection ahead of the first operation.
    ///
    /// Stores without a connection phase succeed immediately. Callers bound
    /// this with the connect timeout, never with the per-operation one.
    async fn connect(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Returns true once `connect` has succeeded.
    fn is_connected(&self) -> bool {
        true
    }

    /// Verifies that the backend answers requests.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Returns the name of this store, used for logging.
    fn name(&self) -> &str;

    /// Releases the backend connection.
    ///
    /// After closing, `is_available` returns `false` and operations fail
    /// with `StoreError::Closed`. The default implementation is a no-op.
    async fn close(&self) {}
}
