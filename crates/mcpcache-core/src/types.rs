//! Common type definitions and newtypes for the configuration cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the record that owns a set of server configurations.
///
/// This is the `mcpServerId` of the proxy: every cached payload is scoped
/// to exactly one owner. Identifiers are compared byte for byte, no case
/// folding or trimming is applied.
///
/// # Example
///
/// ```
/// use mcpcache_core::ServerId;
///
/// let id = ServerId::new("srv-1");
/// assert_eq!(id.as_str(), "srv-1");
/// assert!(!id.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Creates a new ServerId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ServerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ServerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Logical mount point of one server within an owning configuration set.
///
/// # Example
///
/// ```
/// use mcpcache_core::Namespace;
///
/// let ns = Namespace::new("github");
/// assert_eq!(ns.to_string(), "github");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a new Namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the namespace as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_id_is_not_normalized() {
        let a = ServerId::new("Srv-1");
        let b = ServerId::new("srv-1");

        assert_ne!(a, b);
        assert_eq!(a.as_str(), "Srv-1");
    }

    #[test]
    fn test_server_id_serializes_transparently() {
        let id = ServerId::new("srv-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"srv-1\"");
    }

    #[test]
    fn test_empty_server_id() {
        assert!(ServerId::new("").is_empty());
        assert!(!ServerId::from("x").is_empty());
    }

    #[test]
    fn test_namespace_display() {
        let ns: Namespace = "filesystem".into();
        assert_eq!(format!("{}", ns), "filesystem");
    }
}
