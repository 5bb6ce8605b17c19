//! Payload types returned by the configuration data source.
//!
//! The cache stores exactly what the data source returns for one owner:
//! an ordered list of `(namespace, config)` pairs. The order is the order
//! in which the proxy exposes servers and tools, so it is preserved by
//! every serialization path.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::types::Namespace;

/// Connection record of one remote MCP server.
///
/// The data source owns this record. The well known fields are modeled
/// explicitly; anything else is carried verbatim in `extra` so that new
/// fields survive a trip through the cache. Keys in `extra` must not
/// repeat the names of the explicit fields.
///
/// # Example
///
/// ```
/// use mcpcache_core::RemoteServerConfig;
///
/// let config = RemoteServerConfig::stdio("npx")
///     .arg("-y")
///     .arg("@modelcontextprotocol/server-github")
///     .env_var("GITHUB_TOKEN", "ghp_xxx");
///
/// assert_eq!(config.command.as_deref(), Some("npx"));
/// assert_eq!(config.args.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteServerConfig {
    /// Transport kind (`stdio`, `sse`, `streamable_http`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    /// Executable for stdio servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Command line arguments, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables, in insertion order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, String>,

    /// Endpoint for HTTP based transports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Extra request headers for HTTP based transports.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,

    /// Any other field of the source record.
    ///
    /// Keys that name one of the fields above are never serialized.
    #[serde(flatten, serialize_with = "serialize_extra")]
    pub extra: IndexMap<String, Value>,
}

/// Wire names of the explicitly modeled fields.
const RESERVED_FIELDS: [&str; 6] = ["transport", "command", "args", "env", "url", "headers"];

fn is_reserved(key: &str) -> bool {
    RESERVED_FIELDS.contains(&key)
}

// A duplicate key would make the record unreadable on the way back.
fn serialize_extra<S>(extra: &IndexMap<String, Value>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(extra.iter().filter(|(key, _)| !is_reserved(key)))
}

impl RemoteServerConfig {
    /// Creates a stdio server config for the given command.
    pub fn stdio(command: impl Into<String>) -> Self {
        Self {
            transport: Some("stdio".to_string()),
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Creates an HTTP server config for the given endpoint.
    pub fn remote(transport: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            transport: Some(transport.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Appends a command line argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable.
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets an additional opaque field.
    ///
    /// Keys that name a modeled field (`command`, `args`, ...) are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.extra.insert(key, value.into());
        }
        self
    }
}

/// One server mount inside an owning configuration set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Mount point, unique within the owning set.
    pub namespace: Namespace,
    /// The server's connection record.
    pub config: RemoteServerConfig,
}

impl ConfigEntry {
    /// Creates a new entry.
    pub fn new(namespace: impl Into<Namespace>, config: RemoteServerConfig) -> Self {
        Self {
            namespace: namespace.into(),
            config,
        }
    }
}

/// Ordered list of entries cached for a single owner.
///
/// Serializes as a plain JSON array.
///
/// # Example
///
/// ```
/// use mcpcache_core::{CachedPayload, ConfigEntry, RemoteServerConfig};
///
/// let payload: CachedPayload = vec![
///     ConfigEntry::new("b", RemoteServerConfig::stdio("uvx")),
///     ConfigEntry::new("a", RemoteServerConfig::stdio("npx")),
/// ]
/// .into();
///
/// let names: Vec<_> = payload.namespaces().collect();
/// assert_eq!(names, ["b", "a"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CachedPayload(Vec<ConfigEntry>);

impl CachedPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an entry, keeping insertion order.
    pub fn push(&mut self, entry: ConfigEntry) {
        self.0.push(entry);
    }

    /// Returns the entries in order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.0
    }

    /// Consumes the payload and returns its entries.
    pub fn into_entries(self) -> Vec<ConfigEntry> {
        self.0
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigEntry> {
        self.0.iter()
    }

    /// Returns the namespaces in order.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|e| e.namespace.as_str())
    }

    /// Finds the config mounted at the given namespace.
    pub fn get(&self, namespace: &str) -> Option<&RemoteServerConfig> {
        self.0
            .iter()
            .find(|e| e.namespace.as_str() == namespace)
            .map(|e| &e.config)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ConfigEntry>> for CachedPayload {
    fn from(entries: Vec<ConfigEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<ConfigEntry> for CachedPayload {
    fn from_iter<I: IntoIterator<Item = ConfigEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CachedPayload {
    type Item = ConfigEntry;
    type IntoIter = std::vec::IntoIter<ConfigEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CachedPayload {
    type Item = &'a ConfigEntry;
    type IntoIter = std::slice::Iter<'a, ConfigEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_as_array() {
        let payload: CachedPayload =
            vec![ConfigEntry::new("a", RemoteServerConfig::stdio("npx"))].into();

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!([{ "namespace": "a", "config": { "transport": "stdio", "command": "npx" } }])
        );
    }

    #[test]
    fn test_unknown_fields_are_kept_in_extra() {
        let raw = json!({
            "command": "node",
            "timeoutMs": 1500,
            "tools": ["search", "fetch"]
        });

        let config: RemoteServerConfig = serde_json::from_value(raw).unwrap();

        assert_eq!(config.command.as_deref(), Some("node"));
        assert_eq!(config.extra.get("timeoutMs"), Some(&json!(1500)));
        assert_eq!(config.extra.get("tools"), Some(&json!(["search", "fetch"])));
        assert!(config.transport.is_none());
    }

    #[test]
    fn test_env_keeps_insertion_order() {
        let config = RemoteServerConfig::stdio("x")
            .env_var("ZED", "1")
            .env_var("ALPHA", "2")
            .env_var("MID", "3");

        let keys: Vec<_> = config.env.keys().map(String::as_str).collect();
        assert_eq!(keys, ["ZED", "ALPHA", "MID"]);

        let json = serde_json::to_string(&config).unwrap();
        let back: RemoteServerConfig = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = back.env.keys().map(String::as_str).collect();
        assert_eq!(keys, ["ZED", "ALPHA", "MID"]);
    }

    #[test]
    fn test_get_by_namespace() {
        let payload: CachedPayload = vec![
            ConfigEntry::new("fs", RemoteServerConfig::stdio("fs-server")),
            ConfigEntry::new("web", RemoteServerConfig::remote("sse", "https://x/sse")),
        ]
        .into();

        assert_eq!(
            payload.get("web").and_then(|c| c.url.as_deref()),
            Some("https://x/sse")
        );
        assert!(payload.get("missing").is_none());
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let result = serde_json::from_value::<CachedPayload>(json!({ "namespace": "a" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_with_extra_ignores_modeled_fields() {
        let config = RemoteServerConfig::stdio("npx")
            .with_extra("args", json!(["--evil"]))
            .with_extra("command", json!("sh"))
            .with_extra("timeoutMs", json!(1500));

        assert_eq!(config.command.as_deref(), Some("npx"));
        assert!(config.args.is_empty());
        assert_eq!(config.extra.len(), 1);
    }

    #[test]
    fn test_modeled_keys_in_extra_are_not_serialized() {
        let mut config = RemoteServerConfig::stdio("npx").arg("-y");
        config.extra.insert("args".to_string(), json!(["--other"]));
        config.extra.insert("url".to_string(), json!("https://x"));
        config.extra.insert("region".to_string(), json!("eu"));

        let json = serde_json::to_string(&config).unwrap();
        let back: RemoteServerConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.args, ["-y"]);
        assert!(back.url.is_none());
        assert_eq!(back.extra.len(), 1);
        assert_eq!(back.extra.get("region"), Some(&json!("eu")));
    }
}
