//! Store that never holds anything.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::CacheStore;

/// Always-miss, always-succeed store.
///
/// Every read misses and every write is dropped, so a cache wired to it
/// behaves exactly like direct fetching.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

#[async_trait]
impl CacheStore for NoopStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
