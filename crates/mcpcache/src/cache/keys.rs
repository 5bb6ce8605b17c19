//! Cache key generation.

use std::fmt;

/// Prefijo por defecto de las keys de configuracion.
pub const DEFAULT_KEY_PREFIX: &str = "mcp-config:";

/// Key del backend de cache para un servidor.
///
/// Se deriva como `prefijo + id`. El id no se normaliza: ids distintos
/// producen siempre keys distintas y el mismo id siempre la misma key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
    prefix_len: usize,
}

impl CacheKey {
    /// Deriva la key para `id` con el prefijo dado.
    /// Retorna `None` si el id esta vacio.
    ///
    /// # Examples
    ///
    /// ```
    /// use mcpcache::cache::CacheKey;
    ///
    /// let key = CacheKey::derive("mcp-config:", "srv-1").unwrap();
    /// assert_eq!(key.as_str(), "mcp-config:srv-1");
    /// assert_eq!(key.id(), "srv-1");
    ///
    /// assert!(CacheKey::derive("mcp-config:", "").is_none());
    /// ```
    pub fn derive(prefix: &str, id: &str) -> Option<Self> {
        if id.is_empty() {
            return None;
        }

        Some(Self {
            key: format!("{}{}", prefix, id),
            prefix_len: prefix.len(),
        })
    }

    /// Deriva la key con el prefijo por defecto.
    pub fn for_id(id: &str) -> Option<Self> {
        Self::derive(DEFAULT_KEY_PREFIX, id)
    }

    /// Retorna la key completa.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Retorna el id del servidor.
    pub fn id(&self) -> &str {
        &self.key[self.prefix_len..]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
