//! Stores con fallos inyectados.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mcpcache::store::{CacheStore, MemoryStore, StoreError};
use tokio::sync::OnceCell;

/// Store en memoria que se puede "tirar" y que cuenta las llamadas.
///
/// Ademas de caerse por completo puede fallar solo las escrituras o
/// responder a las lecturas con un error del backend.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    down: AtomicBool,
    failing_writes: AtomicBool,
    read_errors: AtomicBool,
    gets: AtomicU32,
    sets: AtomicU32,
    deletes: AtomicU32,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crea el store ya caido.
    pub fn down() -> Self {
        let store = Self::default();
        store.set_down(true);
        store
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// `set` falla con un error del backend; el resto funciona.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// `get` falla con un error del backend; el resto funciona.
    pub fn set_read_errors(&self, failing: bool) {
        self.read_errors.store(failing, Ordering::SeqCst);
    }

    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> u32 {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u32 {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Total de llamadas que llegaron al store.
    pub fn calls(&self) -> u32 {
        self.gets() + self.sets() + self.deletes()
    }

    /// Acceso directo al contenido, sin contar ni fallar.
    pub fn raw(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            Err(StoreError::unavailable("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.read_errors.load(Ordering::SeqCst) {
            return Err(StoreError::backend("WRONGTYPE Operation against a key"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("OOM command not allowed"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Store que nunca responde a tiempo.
pub struct SlowStore {
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CacheStore for SlowStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Store en memoria cuya conexion tarda `delay` en establecerse.
///
/// Como el cliente Redis, conecta en la primera operacion si nadie llamo
/// antes a `connect`.
pub struct LazyConnectStore {
    inner: MemoryStore,
    delay: Duration,
    ready: OnceCell<()>,
    attempts: AtomicU32,
}

impl LazyConnectStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::default(),
            delay,
            ready: OnceCell::new(),
            attempts: AtomicU32::new(0),
        }
    }

    /// Intentos de conexion iniciados.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn ready(&self) {
        self.ready
            .get_or_init(|| async {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
            })
            .await;
    }
}

#[async_trait]
impl CacheStore for LazyConnectStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ready().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.ready().await;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.ready().await;
        self.inner.delete(key).await
    }

    async fn connect(&self) -> Result<(), StoreError> {
        self.ready().await;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ready.initialized()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ready().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "lazy-connect"
    }
}
