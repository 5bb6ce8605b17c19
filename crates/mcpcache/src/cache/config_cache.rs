//! Cache-aside de configuraciones remotas de servidores MCP.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mcpcache_core::CachedPayload;
use mcpcache_store::{CacheStore, StoreError, StoreOptions, open_store, redact_url};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::availability::Availability;
use crate::cache::flight::SingleFlight;
use crate::cache::keys::{CacheKey, DEFAULT_KEY_PREFIX};
use crate::codec::{Codec, EncryptionKey};
use crate::metrics::CacheMetrics;
use crate::settings::CacheSettings;

/// TTL por defecto (5 minutos).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Timeout por defecto de cada operacion contra el store.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(250);

/// Timeout por defecto para establecer la conexion con el store.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Tiempo por defecto sin consultar el store tras un fallo.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Estado de salud del cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    /// El cache esta configurado y activo.
    pub enabled: bool,
    /// El backend respondio al health check.
    pub available: bool,
    /// Nombre del backend.
    pub backend: Option<String>,
    /// Motivo por el que el cache esta desactivado.
    pub disabled_reason: Option<&'static str>,
    /// Fallos consecutivos del backend.
    pub consecutive_failures: u32,
    /// Ultimo error del backend.
    pub last_error: Option<String>,
}

/// Resultado de consultar el store para una key.
enum Lookup {
    Hit(CachedPayload),
    Miss,
    Unavailable,
}

struct Backend {
    store: Arc<dyn CacheStore>,
    codec: Codec,
}

struct Inner {
    backend: Option<Backend>,
    disabled_reason: Option<&'static str>,
    key_prefix: String,
    ttl: Duration,
    op_timeout: Duration,
    connect_timeout: Duration,
    availability: Availability,
    flights: Option<SingleFlight>,
    metrics: CacheMetrics,
}

/// Cache de configuraciones de servidores MCP.
/// Thread-safe y barato de clonar.
///
/// Los fallos del cache nunca llegan al caller: si el backend no esta
/// disponible, el valor guardado esta corrupto o no se puede escribir, se
/// usa el resultado del fetch. Solo los errores del propio fetch se
/// propagan.
///
/// # Examples
///
/// ```no_run
/// use mcpcache::{CacheSettings, CachedPayload, ConfigCache};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = CacheSettings::from_env()?;
/// let cache = ConfigCache::init(&settings).await;
///
/// let payload = cache
///     .get("srv-1", || async {
///         // Consulta a la base de datos (solo en cache miss)
///         Ok::<_, std::io::Error>(CachedPayload::new())
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigCache {
    inner: Arc<Inner>,
}

impl ConfigCache {
    /// Crea un builder para inyectar store, codec y tiempos.
    pub fn builder() -> ConfigCacheBuilder {
        ConfigCacheBuilder::default()
    }

    /// Crea un cache desactivado: cada `get` va directo al fetch.
    pub fn disabled() -> Self {
        Self::builder().build()
    }

    /// Construye el cache a partir de la configuracion.
    ///
    /// Nunca falla: una configuracion ausente o invalida deja el cache
    /// desactivado y se registra el motivo.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        let builder = Self::builder()
            .key_prefix(settings.key_prefix.clone())
            .ttl(settings.ttl())
            .op_timeout(settings.op_timeout())
            .connect_timeout(settings.connect_timeout())
            .retry_after(settings.retry_after())
            .single_flight(settings.single_flight);

        if !settings.enabled {
            info!("Config cache disabled by configuration");
            return builder.disabled_reason("switched_off").build();
        }

        let Some(url) = settings.url() else {
            info!("Config cache disabled: no backend URL configured");
            return builder.disabled_reason("no_backend").build();
        };

        let Some(secret) = settings.encryption_key() else {
            warn!("Config cache disabled: no encryption key configured");
            return builder.disabled_reason("no_encryption_key").build();
        };

        let key = match EncryptionKey::from_secret(secret) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Config cache disabled: unusable encryption key");
                return builder.disabled_reason("invalid_encryption_key").build();
            },
        };

        let options = StoreOptions {
            connect_timeout: settings.connect_timeout(),
            max_capacity: settings.max_capacity,
        };

        let store = match open_store(url, &options) {
            Ok(store) => store,
            Err(e) => {
                warn!(url = %redact_url(url), error = %e, "Config cache disabled: invalid backend");
                return builder.disabled_reason("invalid_backend").build();
            },
        };

        info!(
            backend = store.name(),
            url = %redact_url(url),
            ttl_secs = settings.ttl,
            "Config cache enabled"
        );

        builder.store(store).codec(Codec::new(&key)).build()
    }

    /// Construye el cache y verifica el backend una vez.
    /// Un backend caido no es un error: las lecturas iran al fetch.
    pub async fn init(settings: &CacheSettings) -> Self {
        let cache = Self::from_settings(settings);

        if cache.is_enabled() {
            let health = cache.health().await;
            if health.available {
                info!(backend = ?health.backend, "Config cache backend reachable");
            } else {
                warn!(
                    backend = ?health.backend,
                    error = ?health.last_error,
                    "Config cache backend not reachable at startup"
                );
            }
        }

        cache
    }

    /// Obtiene la configuracion de `id`, del cache o del fetch.
    ///
    /// `id` es cualquier identificador de servidor: `&str`, `String` o
    /// [`ServerId`](mcpcache_core::ServerId).
    ///
    /// En un miss ejecuta `fetch`, guarda el resultado cifrado con el TTL
    /// configurado (best-effort) y lo retorna. Un valor que no se puede
    /// descifrar se borra y se trata como miss.
    ///
    /// # Errors
    ///
    /// Solo los errores de `fetch`, sin modificar.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use mcpcache::ConfigCache;
    /// # use mcpcache::{ConfigEntry, RemoteServerConfig};
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = ConfigCache::disabled();
    /// let payload = cache
    ///     .get("srv-1", || async {
    ///         Ok::<_, String>(vec![ConfigEntry::new("a", RemoteServerConfig::stdio("npx"))].into())
    ///     })
    ///     .await
    ///     .unwrap();
    /// assert_eq!(payload.len(), 1);
    /// # }
    /// ```
    pub async fn get<F, Fut, E>(
        &self,
        id: impl AsRef<str>,
        fetch: F,
    ) -> Result<CachedPayload, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedPayload, E>>,
    {
        let id = id.as_ref();
        let inner = &self.inner;

        let Some(backend) = inner.backend.as_ref() else {
            inner.metrics.record_bypass("disabled");
            return fetch().await;
        };

        let Some(key) = self.key_for(id) else {
            warn!("Empty server id, bypassing config cache");
            inner.metrics.record_bypass("empty_id");
            return fetch().await;
        };

        if !self.backend_available(backend) {
            debug!(key = %key, "Cache backend unavailable, fetching directly");
            inner.metrics.record_bypass("unavailable");
            return fetch().await;
        }

        match self.lookup(backend, &key).await {
            Lookup::Hit(payload) => {
                inner.metrics.record_hit();
                debug!(key = %key, entries = payload.len(), "Cache hit");
                return Ok(payload);
            },
            Lookup::Unavailable => {
                inner.metrics.record_bypass("unavailable");
                return fetch().await;
            },
            Lookup::Miss => {},
        }

        // Solo una tarea por key ejecuta el fetch
        let _flight = match inner.flights.as_ref() {
            Some(flights) => {
                let guard = flights.acquire(key.as_str()).await;
                if guard.waited() {
                    match self.lookup(backend, &key).await {
                        Lookup::Hit(payload) => {
                            inner.metrics.record_hit();
                            debug!(key = %key, "Cache hit after waiting for in-flight fetch");
                            return Ok(payload);
                        },
                        Lookup::Unavailable => {
                            inner.metrics.record_bypass("unavailable");
                            return fetch().await;
                        },
                        Lookup::Miss => {},
                    }
                }
                Some(guard)
            },
            None => None,
        };

        inner.metrics.record_miss();
        debug!(key = %key, "Cache miss, fetching");

        let payload = fetch().await?;
        self.populate(backend, &key, &payload).await;

        Ok(payload)
    }

    /// Deriva la key del backend para `id`.
    pub fn key_for(&self, id: impl AsRef<str>) -> Option<CacheKey> {
        CacheKey::derive(&self.inner.key_prefix, id.as_ref())
    }

    /// Retorna true si el cache tiene backend y codec configurados.
    pub fn is_enabled(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Retorna el TTL aplicado a todas las entradas.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Retorna las metricas para acceso externo.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.inner.metrics
    }

    /// Verifica el backend y retorna el estado del cache.
    pub async fn health(&self) -> CacheHealth {
        let inner = &self.inner;

        let Some(backend) = inner.backend.as_ref() else {
            return CacheHealth {
                enabled: false,
                available: false,
                backend: None,
                disabled_reason: inner.disabled_reason,
                consecutive_failures: 0,
                last_error: None,
            };
        };

        let available = backend.store.is_available()
            && self.ensure_connected(&backend.store).await.is_ok()
            && self
                .guarded("health_check", backend.store.health_check())
                .await
                .is_ok();

        CacheHealth {
            enabled: true,
            available,
            backend: Some(backend.store.name().to_string()),
            disabled_reason: None,
            consecutive_failures: inner.availability.failure_count(),
            last_error: inner.availability.last_error(),
        }
    }

    /// Cierra la conexion con el backend.
    /// Despues de cerrar, cada `get` va directo al fetch.
    pub async fn close(&self) {
        if let Some(backend) = self.inner.backend.as_ref() {
            backend.store.close().await;
            info!(backend = backend.store.name(), "Config cache closed");
        }
    }

    pub(crate) fn backend(&self) -> Option<&Arc<dyn CacheStore>> {
        self.inner.backend.as_ref().map(|b| &b.store)
    }

    /// Establece la conexion del store si aun no existe.
    ///
    /// Se acota con el timeout de conexion: una conexion lenta no debe
    /// cancelarse con el timeout de operacion.
    pub(crate) async fn ensure_connected(
        &self,
        backend: &Arc<dyn CacheStore>,
    ) -> Result<(), StoreError> {
        if backend.is_connected() {
            return Ok(());
        }

        self.guarded_with("connect", self.inner.connect_timeout, backend.connect())
            .await
    }

    fn backend_available(&self, backend: &Backend) -> bool {
        backend.store.is_available() && self.inner.availability.allows_attempt()
    }

    /// Lee y descifra la entrada de `key`.
    async fn lookup(&self, backend: &Backend, key: &CacheKey) -> Lookup {
        if self.ensure_connected(&backend.store).await.is_err() {
            return Lookup::Unavailable;
        }

        let raw = match self.guarded("get", backend.store.get(key.as_str())).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Miss,
            Err(e) if e.is_unavailable() => return Lookup::Unavailable,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return Lookup::Miss;
            },
        };

        match backend.codec.decode(&raw) {
            Ok(payload) => Lookup::Hit(payload),
            Err(e) => {
                // Nunca loguear el valor: contiene credenciales cifradas
                warn!(key = %key, reason = e.kind(), "Cache decode failed, discarding entry");
                self.inner.metrics.record_error("decode");

                if let Err(e) = self.guarded("delete", backend.store.delete(key.as_str())).await {
                    debug!(key = %key, error = %e, "Failed to delete undecodable entry");
                }
                Lookup::Miss
            },
        }
    }

    /// Cifra y guarda el payload. Los fallos solo se registran.
    async fn populate(&self, backend: &Backend, key: &CacheKey, payload: &CachedPayload) {
        let encoded = match backend.codec.encode(payload) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache encode failed, skipping population");
                self.inner.metrics.record_error("encode");
                return;
            },
        };

        if !self.backend_available(backend) {
            debug!(key = %key, "Cache backend unavailable, skipping population");
            return;
        }

        match self
            .guarded("set", backend.store.set(key.as_str(), &encoded, self.inner.ttl))
            .await
        {
            Ok(()) => debug!(
                key = %key,
                entries = payload.len(),
                ttl_secs = self.inner.ttl.as_secs(),
                "Cache populated"
            ),
            Err(e) => warn!(key = %key, error = %e, "Cache write failed"),
        }
    }

    /// Ejecuta una operacion del store con timeout, metricas y registro
    /// de disponibilidad.
    pub(crate) async fn guarded<T, Fut>(
        &self,
        operation: &'static str,
        op: Fut,
    ) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.guarded_with(operation, self.inner.op_timeout, op).await
    }

    async fn guarded_with<T, Fut>(
        &self,
        operation: &'static str,
        timeout: Duration,
        op: Fut,
    ) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let inner = &self.inner;
        let start = Instant::now();

        let result = match tokio::time::timeout(timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::timeout(timeout)),
        };

        inner
            .metrics
            .record_operation_duration(operation, start.elapsed());

        match &result {
            Ok(_) => {
                if inner.availability.record_success() {
                    info!(operation, "Cache backend available again");
                }
            },
            Err(e) if e.is_unavailable() => {
                inner.metrics.record_error(e.kind());
                if inner.availability.record_failure(e.to_string()) {
                    warn!(
                        operation,
                        error = %e,
                        retry_after_ms = inner.availability.retry_after().as_millis() as u64,
                        "Cache backend unavailable, falling back to direct fetch"
                    );
                } else {
                    debug!(operation, error = %e, "Cache backend still unavailable");
                }
            },
            Err(e) => {
                inner.metrics.record_error(e.kind());
            },
        }

        result
    }
}

/// Builder de [`ConfigCache`].
pub struct ConfigCacheBuilder {
    store: Option<Arc<dyn CacheStore>>,
    codec: Option<Codec>,
    disabled_reason: Option<&'static str>,
    key_prefix: String,
    ttl: Duration,
    op_timeout: Duration,
    connect_timeout: Duration,
    retry_after: Duration,
    single_flight: bool,
}

impl Default for ConfigCacheBuilder {
    fn default() -> Self {
        Self {
            store: None,
            codec: None,
            disabled_reason: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: DEFAULT_TTL,
            op_timeout: DEFAULT_OP_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_after: DEFAULT_RETRY_AFTER,
            single_flight: true,
        }
    }
}

impl ConfigCacheBuilder {
    /// Define el store compartido.
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Define el codec.
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Define el prefijo de las keys.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Define el TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Define el timeout de cada operacion del store.
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Define el timeout para establecer la conexion con el store.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Define el tiempo sin consultar el store tras un fallo.
    pub fn retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Activa o desactiva la coalescencia de misses por key.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    fn disabled_reason(mut self, reason: &'static str) -> Self {
        self.disabled_reason = Some(reason);
        self
    }

    /// Construye el cache. Sin store o sin codec queda desactivado.
    pub fn build(self) -> ConfigCache {
        let (backend, disabled_reason) = match (self.store, self.codec) {
            (Some(store), Some(codec)) => (Some(Backend { store, codec }), None),
            _ => (None, Some(self.disabled_reason.unwrap_or("not_configured"))),
        };

        ConfigCache {
            inner: Arc::new(Inner {
                backend,
                disabled_reason,
                key_prefix: self.key_prefix,
                ttl: self.ttl,
                op_timeout: self.op_timeout,
                connect_timeout: self.connect_timeout,
                availability: Availability::new(self.retry_after),
                flights: self.single_flight.then(SingleFlight::new),
                metrics: CacheMetrics::new(),
            }),
        }
    }
}
