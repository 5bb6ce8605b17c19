//! In-process store backed by moka.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use crate::error::StoreError;
use crate::traits::CacheStore;

/// Default maximum number of entries.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct StoredValue {
    value: String,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
struct WriteTtl;

impl Expiry<String, StoredValue> for WriteTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache store.
///
/// Thread-safe and async-friendly. Useful for single-process deployments
/// (`memory://`) and for tests.
pub struct MemoryStore {
    inner: Cache<String, StoredValue>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Creates a store holding at most `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WriteTtl)
            .build();

        Self {
            inner,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Runs pending maintenance (expiry, eviction) immediately.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.get(key).await.map(|stored| stored.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.inner
            .insert(
                key.to_string(),
                StoredValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.inner.remove(key).await.is_some())
    }

    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    fn name(&self) -> &str {
        "memory"
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.inner.invalidate_all();
    }
}
