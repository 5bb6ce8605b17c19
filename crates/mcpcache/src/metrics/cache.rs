//! Cache metrics recording.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registra las metricas de cache.
/// Llamar una vez al inicio para registrar las metricas.
pub fn register_cache_metrics() {
    metrics::describe_counter!("mcpcache_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!(
        "mcpcache_cache_misses_total",
        "Total number of cache misses"
    );
    metrics::describe_counter!(
        "mcpcache_cache_bypass_total",
        "Lookups served by a direct fetch without consulting the cache"
    );
    metrics::describe_counter!(
        "mcpcache_cache_errors_total",
        "Cache-internal errors absorbed by the cache layer"
    );
    metrics::describe_histogram!(
        "mcpcache_cache_operation_seconds",
        "Time spent on cache store operations"
    );
}

/// Recorder de metricas de cache.
/// Usa atomic counters internos para maximo rendimiento.
#[derive(Debug, Clone)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    bypasses: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self {
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            bypasses: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("mcpcache_cache_hits_total").increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("mcpcache_cache_misses_total").increment(1);
    }

    /// Registra un fetch directo sin pasar por el cache
    pub fn record_bypass(&self, reason: &'static str) {
        self.bypasses.fetch_add(1, Ordering::Relaxed);
        counter!("mcpcache_cache_bypass_total", "reason" => reason).increment(1);
    }

    /// Registra un error absorbido (decode, encode, timeout, ...)
    pub fn record_error(&self, kind: &'static str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("mcpcache_cache_errors_total", "kind" => kind).increment(1);
    }

    /// Registra la duracion de una operacion
    pub fn record_operation_duration(&self, operation: &'static str, duration: Duration) {
        histogram!(
            "mcpcache_cache_operation_seconds",
            "operation" => operation
        )
        .record(duration.as_secs_f64());
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        let total = hits + misses;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    /// Retorna el numero de hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Retorna el numero de misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Retorna el numero de bypasses
    pub fn bypasses(&self) -> u64 {
        self.bypasses.load(Ordering::Relaxed)
    }

    /// Retorna el numero de errores absorbidos
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self::new()
    }
}
