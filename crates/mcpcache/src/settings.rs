//! Cache settings loaded from the environment.
//!
//! Every variable is optional. Without `CACHE_URL` or
//! `CACHE_ENCRYPTION_KEY` caching is simply disabled; that is a valid
//! configuration, not an error.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `CACHE_ENABLED` | explicit on/off switch | `true` |
//! | `CACHE_URL` | `redis://` or `memory://` (`rediss://` is rejected) | unset |
//! | `CACHE_ENCRYPTION_KEY` | base64 32-byte key or passphrase | unset |
//! | `CACHE_TTL` | entry TTL in seconds | `300` |
//! | `CACHE_KEY_PREFIX` | key prefix | `mcp-config:` |
//! | `CACHE_OP_TIMEOUT_MS` | bound on every store operation | `250` |
//! | `CACHE_CONNECT_TIMEOUT_MS` | bound on connecting to Redis | `500` |
//! | `CACHE_RETRY_AFTER_MS` | pause after the backend fails | `5000` |
//! | `CACHE_SINGLE_FLIGHT` | coalesce concurrent misses per key | `true` |
//! | `CACHE_MAX_CAPACITY` | entries kept by the memory backend | `10000` |

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::keys::DEFAULT_KEY_PREFIX;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CACHE";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or a value has the wrong type.
    #[error("failed to load cache settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid cache setting '{field}': {message}")]
    Invalid {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

impl SettingsError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Settings of the configuration cache.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Explicit switch; `false` disables caching even when configured.
    pub enabled: bool,
    /// Backend URL.
    pub url: Option<String>,
    /// Encryption key material.
    pub encryption_key: Option<String>,
    /// TTL in seconds applied to every entry.
    pub ttl: u64,
    /// Prefix of every cache key.
    pub key_prefix: String,
    /// Timeout of each store operation, in milliseconds.
    pub op_timeout_ms: u64,
    /// Timeout of the initial Redis connection, in milliseconds.
    pub connect_timeout_ms: u64,
    /// How long to skip the backend after it fails, in milliseconds.
    pub retry_after_ms: u64,
    /// Coalesce concurrent misses for the same key.
    pub single_flight: bool,
    /// Capacity of the memory backend.
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            encryption_key: None,
            ttl: 300,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            op_timeout_ms: 250,
            connect_timeout_ms: 500,
            retry_after_ms: 5_000,
            single_flight: true,
            max_capacity: 10_000,
        }
    }
}

impl CacheSettings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load(None)
    }

    /// Loads settings from an optional file, overridden by the environment.
    ///
    /// The file format is inferred from its extension (TOML, YAML, JSON...).
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Self = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        settings.validate()
    }

    /// Loads settings from explicit `CACHE_*` variables instead of the
    /// process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let settings: Self = Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()?
            .try_deserialize()?;

        settings.validate()
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if self.ttl == 0 {
            return Err(SettingsError::invalid("ttl", "must be at least 1 second"));
        }
        if self.op_timeout_ms == 0 {
            return Err(SettingsError::invalid("op_timeout_ms", "must be positive"));
        }
        if self.connect_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connect_timeout_ms",
                "must be positive",
            ));
        }
        Ok(self)
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    /// Returns the store operation timeout.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the retry-after window.
    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms)
    }

    /// Returns the backend URL if set and non-blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Returns the key material if set and non-blank.
    pub fn encryption_key(&self) -> Option<&str> {
        self.encryption_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("enabled", &self.enabled)
            .field("url", &self.url().map(mcpcache_store::redact_url))
            .field(
                "encryption_key",
                &self.encryption_key().map(|_| "***"),
            )
            .field("ttl", &self.ttl)
            .field("key_prefix", &self.key_prefix)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("retry_after_ms", &self.retry_after_ms)
            .field("single_flight", &self.single_flight)
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
