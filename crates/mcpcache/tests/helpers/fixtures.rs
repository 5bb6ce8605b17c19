//! Datos y construccion de caches para tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mcpcache::store::CacheStore;
use tracing_subscriber::EnvFilter;
use mcpcache::{CachedPayload, Codec, ConfigCache, ConfigEntry, EncryptionKey, RemoteServerConfig};

/// Activa los logs del cache en los tests (`RUST_LOG=mcpcache=debug`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Payload con un servidor stdio con secretos y uno HTTP con headers.
pub fn sample_payload() -> CachedPayload {
    vec![
        ConfigEntry::new(
            "github",
            RemoteServerConfig::stdio("npx")
                .arg("-y")
                .arg("@modelcontextprotocol/server-github")
                .env_var("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_secret_token"),
        ),
        ConfigEntry::new(
            "search",
            RemoteServerConfig::remote("streamable_http", "https://search.internal/mcp")
                .header("Authorization", "Bearer abc.def.ghi"),
        ),
    ]
    .into()
}

/// Cache con los tiempos por defecto sobre `store`.
pub fn cache_over(store: Arc<dyn CacheStore>, key: &EncryptionKey) -> ConfigCache {
    ConfigCache::builder()
        .store(store)
        .codec(Codec::new(key))
        .build()
}

/// Futuro retornado por los fetch de test.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<CachedPayload, String>> + Send>>;

/// Cuenta las invocaciones de una funcion de fetch.
#[derive(Clone, Default)]
pub struct FetchCounter {
    calls: Arc<AtomicU32>,
}

impl FetchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch que retorna `payload` tras `delay`.
    pub fn fetch(
        &self,
        payload: CachedPayload,
        delay: Duration,
    ) -> impl FnOnce() -> FetchFuture + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(payload)
            })
        }
    }

    /// Fetch que falla con `message`.
    pub fn failing(&self, message: &str) -> impl FnOnce() -> FetchFuture + Send + 'static {
        let calls = Arc::clone(&self.calls);
        let message = message.to_string();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(message)
            })
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}
