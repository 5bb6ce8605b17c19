//! Error types for the payload codec.
//!
//! The codec turns a [`CachedPayload`](crate::CachedPayload) into an
//! encrypted string and back. Its failures are never fatal to callers of
//! the cache: an `EncodeError` skips population and a `DecodeError` is
//! treated as a miss. Error messages never include the payload, the
//! ciphertext or key material, so they are safe to log.
//!
//! # Example
//!
//! ```
//! use mcpcache_core::DecodeError;
//!
//! let error = DecodeError::malformed("missing version prefix");
//! assert!(error.is_malformed());
//! assert!(error.to_string().contains("missing version prefix"));
//! ```

use thiserror::Error;

/// Error produced while serializing or encrypting a payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The payload could not be serialized.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The cipher rejected the plaintext.
    #[error("failed to encrypt payload: {0}")]
    Encrypt(String),
}

impl EncodeError {
    /// Creates an Encrypt error.
    pub fn encrypt(message: impl Into<String>) -> Self {
        Self::Encrypt(message.into())
    }
}

/// Error produced while decrypting or parsing a stored value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The stored value does not have the expected envelope.
    #[error("malformed cache value: {reason}")]
    Malformed {
        /// What was wrong with the envelope.
        reason: String,
    },

    /// Authentication failed: tampered value or wrong key.
    #[error("cache value failed authentication")]
    Authentication,

    /// The plaintext is not a valid payload.
    ///
    /// The parser message is only reachable through `source()`; it may
    /// quote fragments of the plaintext.
    #[error("cache value does not match payload schema")]
    Schema(#[source] serde_json::Error),
}

impl DecodeError {
    /// Creates a Malformed error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Returns true if the envelope itself was malformed.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Returns true if the value failed authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Returns true if the plaintext did not match the payload schema.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed",
            Self::Authentication => "authentication",
            Self::Schema(_) => "schema",
        }
    }
}

/// Error produced when building an encryption key from configuration.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key material was provided.
    #[error("encryption key is empty")]
    Empty,

    /// The key material could not be used.
    #[error("invalid encryption key: {0}")]
    Invalid(String),
}
