//! Redis store implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::traits::CacheStore;

/// Default timeout for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// A Redis-backed cache store.
///
/// The connection is established once, on first use, and shared by every
/// caller afterwards. `ConnectionManager` reconnects on its own when the
/// server drops the connection.
pub struct RedisStore {
    /// Parsed client, used to open the connection.
    client: redis::Client,
    /// The shared connection, set on first successful connect.
    connection: OnceCell<ConnectionManager>,
    /// Bound on how long a connect attempt may take.
    connect_timeout: Duration,
    /// Set by `close`.
    closed: AtomicBool,
}

impl RedisStore {
    /// Creates a store for the given `redis://` or `rediss://` URL.
    ///
    /// Only the URL is validated here; no connection is opened until
    /// `connect` or the first operation.
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connect_timeout,
            closed: AtomicBool::new(false),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let manager = self
            .connection
            .get_or_try_init(|| async {
                debug!("Opening Redis connection");
                let manager = tokio::time::timeout(
                    self.connect_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                .map_err(|_| StoreError::timeout(self.connect_timeout))?
                .map_err(map_redis_error)?;
                info!("Redis connection established");
                Ok::<_, StoreError>(manager)
            })
            .await?;

        Ok(manager.clone())
    }
}

/// Classifies a Redis error.
fn map_redis_error(e: redis::RedisError) -> StoreError {
    if e.is_timeout() {
        StoreError::unavailable(format!("timeout: {}", e))
    } else if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() {
        StoreError::unavailable(e.to_string())
    } else {
        StoreError::backend(e.to_string())
    }
}

/// Redis expiry works in whole seconds.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    let secs = if ttl.subsec_nanos() > 0 { secs + 1 } else { secs };
    secs.max(1)
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value, ttl_seconds(ttl))
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await.map_err(map_redis_error)?;
        Ok(removed > 0)
    }

    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn connect(&self) -> Result<(), StoreError> {
        self.connection().await.map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::backend(format!("unexpected PING reply: {}", pong)))
        }
    }

    fn name(&self) -> &str {
        "redis"
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Redis store closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisStore::new("not a url", DEFAULT_CONNECT_TIMEOUT);
        assert!(matches!(result, Err(StoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_does_not_connect() {
        let store = RedisStore::new("redis://127.0.0.1:1", DEFAULT_CONNECT_TIMEOUT).unwrap();

        assert!(!store.is_connected());
        assert!(store.is_available());
        assert_eq!(store.name(), "redis");
    }

    #[test]
    fn test_ttl_rounds_up_to_seconds() {
        assert_eq!(ttl_seconds(Duration::from_secs(300)), 300);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(10)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Port 1 is never a Redis server.
        let store = RedisStore::new("redis://127.0.0.1:1", Duration::from_millis(200)).unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(err.is_unavailable(), "unexpected error: {err}");
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_bounded_by_connect_timeout() {
        let store = RedisStore::new("redis://127.0.0.1:1", Duration::from_millis(200)).unwrap();

        let start = std::time::Instant::now();
        let err = store.connect().await.unwrap_err();

        assert!(err.is_unavailable(), "unexpected error: {err}");
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn test_closed_store() {
        let store = RedisStore::new("redis://127.0.0.1:1", DEFAULT_CONNECT_TIMEOUT).unwrap();

        store.close().await;

        assert!(!store.is_available());
        assert!(matches!(store.get("k").await, Err(StoreError::Closed)));
    }
}
