//! Encrypted payload codec.
//!
//! Values are written to a shared cache backend, so they are never stored
//! in clear text. A payload is serialized to canonical JSON and sealed with
//! AES-256-GCM under a process-wide key:
//!
//! ```text
//! v1:<base64(nonce[12] || ciphertext || tag[16])>
//! ```
//!
//! A fresh random nonce is drawn for every value. Tampering, a wrong key or
//! a truncated value all surface as a [`DecodeError`].

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use mcpcache_core::{CachedPayload, DecodeError, EncodeError, KeyError};
use sha2::{Digest, Sha256};

/// Envelope version prefix.
const VERSION_PREFIX: &str = "v1:";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
const TAG_LEN: usize = 16;

/// Key length in bytes (AES-256).
const KEY_LEN: usize = 32;

/// Symmetric key used by the [`Codec`].
///
/// `Debug` never prints key material.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses a base64 encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(KeyError::Empty);
        }

        let raw = BASE64_STANDARD
            .decode(encoded)
            .map_err(|e| KeyError::Invalid(format!("not valid base64: {}", e)))?;

        let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            KeyError::Invalid(format!("expected {} bytes, got {}", KEY_LEN, raw.len()))
        })?;

        Ok(Self(bytes))
    }

    /// Builds a key from configuration.
    ///
    /// A base64 value of exactly 32 bytes is used as is; any other
    /// non-empty secret is stretched with SHA-256.
    pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
        match Self::from_base64(secret) {
            Ok(key) => Ok(key),
            Err(KeyError::Empty) => Err(KeyError::Empty),
            Err(KeyError::Invalid(_)) => {
                let digest = Sha256::digest(secret.trim().as_bytes());
                let mut bytes = [0u8; KEY_LEN];
                bytes.copy_from_slice(&digest);
                Ok(Self(bytes))
            },
        }
    }

    /// Generates a new random key.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    /// Returns the key as base64, the format accepted by `from_base64`.
    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(self.0)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(***)")
    }
}

/// Serializes and encrypts cached payloads.
#[derive(Clone)]
pub struct Codec {
    cipher: Aes256Gcm,
}

impl Codec {
    /// Creates a codec sealing values with the given key.
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0)),
        }
    }

    /// Serializes and encrypts a payload.
    ///
    /// # Errors
    ///
    /// - `EncodeError::Serialize` if the payload cannot be serialized
    /// - `EncodeError::Encrypt` if the cipher fails
    pub fn encode(&self, payload: &CachedPayload) -> Result<String, EncodeError> {
        let plaintext = serde_json::to_vec(payload).map_err(EncodeError::Serialize)?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|_| EncodeError::encrypt("AES-GCM encryption failed"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", VERSION_PREFIX, BASE64_STANDARD.encode(sealed)))
    }

    /// Decrypts and parses a stored value.
    ///
    /// # Errors
    ///
    /// - `DecodeError::Malformed` for an unknown version, bad base64 or a
    ///   value too short to hold a nonce and tag
    /// - `DecodeError::Authentication` if the tag does not verify
    /// - `DecodeError::Schema` if the plaintext is not a payload
    pub fn decode(&self, raw: &str) -> Result<CachedPayload, DecodeError> {
        let body = raw
            .strip_prefix(VERSION_PREFIX)
            .ok_or_else(|| DecodeError::malformed("unknown envelope version"))?;

        let sealed = BASE64_STANDARD
            .decode(body)
            .map_err(|_| DecodeError::malformed("invalid base64"))?;

        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(DecodeError::malformed("value too short"));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecodeError::Authentication)?;

        serde_json::from_slice(&plaintext).map_err(DecodeError::Schema)
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}
