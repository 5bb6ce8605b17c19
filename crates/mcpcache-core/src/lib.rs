//! MCP Cache Core - Domain types and errors
//!
//! This crate provides the foundational types shared by the cache layer:
//! the payload shape returned by the configuration data source and the
//! error hierarchy of the payload codec.

pub mod error;
pub mod payload;
pub mod types;

pub use error::{DecodeError, EncodeError, KeyError};
pub use payload::{CachedPayload, ConfigEntry, RemoteServerConfig};
pub use types::{Namespace, ServerId};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
