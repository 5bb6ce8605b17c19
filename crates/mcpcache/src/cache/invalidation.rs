//! Explicit cache invalidation.

use tracing::{debug, info, warn};

use crate::cache::ConfigCache;

/// Resultado de una operación de invalidación.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationResult {
    /// Número de entries eliminadas del store.
    pub count: usize,
    /// Keys sobre las que se intentó el borrado.
    pub keys: Vec<String>,
}

impl ConfigCache {
    /// Invalida la configuración cacheada de `id`.
    ///
    /// Best-effort: si el store no está disponible o el borrado falla se
    /// registra y se retorna normalmente. El siguiente `get` vuelve a
    /// ejecutar el fetch si el borrado llegó al store; si no, la entrada
    /// expira por TTL.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use mcpcache::ConfigCache;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = ConfigCache::disabled();
    /// // Despues de modificar la configuracion del servidor
    /// let result = cache.invalidate("srv-1").await;
    /// println!("Invalidated {} entries", result.count);
    /// # }
    /// ```
    pub async fn invalidate(&self, id: impl AsRef<str>) -> InvalidationResult {
        let id = id.as_ref();
        let Some(store) = self.backend() else {
            debug!("Config cache disabled, nothing to invalidate");
            return InvalidationResult::default();
        };

        let Some(key) = self.key_for(id) else {
            warn!("Empty server id, nothing to invalidate");
            return InvalidationResult::default();
        };

        let mut result = InvalidationResult {
            count: 0,
            keys: vec![key.to_string()],
        };

        // Se intenta aunque el backend este marcado como caido: perder una
        // invalidacion deja datos viejos hasta el TTL
        if !store.is_available() {
            warn!(key = %key, "Cache backend closed, invalidation skipped");
            return result;
        }

        let deleted = match self.ensure_connected(store).await {
            Ok(()) => self.guarded("delete", store.delete(key.as_str())).await,
            Err(e) => Err(e),
        };

        match deleted {
            Ok(removed) => {
                result.count = usize::from(removed);
                info!(key = %key, removed = removed, "Cache entry invalidated");
            },
            Err(e) => {
                warn!(key = %key, error = %e, "Cache invalidation failed");
            },
        }

        result
    }

    /// Invalida varios ids a la vez.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use mcpcache::ConfigCache;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let cache = ConfigCache::disabled();
    /// let result = cache.invalidate_many(["srv-1", "srv-2"]).await;
    /// println!("Invalidated {} entries", result.count);
    /// # }
    /// ```
    pub async fn invalidate_many<I, S>(&self, ids: I) -> InvalidationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut total = InvalidationResult::default();

        for id in ids {
            let result = self.invalidate(id).await;
            total.count += result.count;
            total.keys.extend(result.keys);
        }

        total
    }
}
