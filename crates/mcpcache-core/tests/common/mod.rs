#![allow(dead_code)]
use mcpcache_core::{CachedPayload, ConfigEntry, RemoteServerConfig};

/// Returns a payload with stdio and HTTP servers, secrets and opaque fields.
pub fn mixed_payload() -> CachedPayload {
    vec![
        ConfigEntry::new(
            "github",
            RemoteServerConfig::stdio("npx")
                .arg("-y")
                .arg("@modelcontextprotocol/server-github")
                .env_var("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_0123456789")
                .env_var("GITHUB_API_URL", "https://api.github.com"),
        ),
        ConfigEntry::new(
            "search",
            RemoteServerConfig::remote("streamable_http", "https://search.internal/mcp")
                .header("Authorization", "Bearer abc.def.ghi")
                .with_extra("tools", serde_json::json!(["web_search", "news_search"])),
        ),
        ConfigEntry::new("local", RemoteServerConfig::stdio("uvx").arg("mcp-server-time")),
    ]
    .into()
}
