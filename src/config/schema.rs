//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, in-flight limit).
    pub listener: ListenerConfig,

    /// Route definitions, checked in the order they are listed.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// GraphQL endpoint settings.
    pub graphql: GraphqlConfig,

    /// Startup fetch of the sample JSON document.
    pub sample_client: SampleClientConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: vec![RouteConfig::sample_proxy()],
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
            graphql: GraphqlConfig::default(),
            sample_client: SampleClientConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum requests in flight; excess requests wait for a slot.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// A single proxy route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub id: String,

    /// Path pattern: a literal path, `{name}` segments, or a trailing `/**`.
    pub path: String,

    /// Host header to match (exact, case-insensitive).
    #[serde(default)]
    pub host: Option<String>,

    /// Allowed methods. Empty means any method.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Request headers that must be present.
    #[serde(default)]
    pub headers: Vec<HeaderPredicateConfig>,

    /// Upstream base URI. Only scheme and authority are used.
    pub uri: String,

    /// Replacement path; may reference `{name}` variables from `path`.
    #[serde(default)]
    pub set_path: Option<String>,

    /// Number of leading path segments to drop.
    #[serde(default)]
    pub strip_prefix: Option<usize>,

    /// Response headers appended to the upstream reply.
    #[serde(default)]
    pub add_response_headers: Vec<HeaderEntry>,

    /// Response headers replacing any upstream value.
    #[serde(default)]
    pub set_response_headers: Vec<HeaderEntry>,

    /// Response headers removed from the upstream reply.
    #[serde(default)]
    pub remove_response_headers: Vec<String>,
}

impl RouteConfig {
    /// The `/proxy` route shipped with the default configuration.
    pub fn sample_proxy() -> Self {
        Self {
            id: "sample-json".to_string(),
            path: "/proxy".to_string(),
            host: None,
            methods: Vec::new(),
            headers: Vec::new(),
            uri: "https://tools.learningcontainer.com/".to_string(),
            set_path: Some("/sample-json.json".to_string()),
            strip_prefix: None,
            add_response_headers: vec![
                HeaderEntry::new("X-Josh-Loves-Gateway", "true"),
                HeaderEntry::new("Access-Control-Allow-Origin", "*"),
            ],
            set_response_headers: Vec::new(),
            remove_response_headers: Vec::new(),
        }
    }
}

/// A header name/value pair.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Header condition on the inbound request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderPredicateConfig {
    pub name: String,

    /// Required exact value. `None` only requires presence.
    #[serde(default)]
    pub value: Option<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total upstream exchange timeout (send + full response body) in seconds.
    pub upstream_secs: u64,

    /// Inbound request deadline in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// GraphQL endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphqlConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/graphql".to_string(),
        }
    }
}

/// Sample client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SampleClientConfig {
    /// Fetch and log the sample document once the listener is bound.
    pub enabled: bool,

    /// Base URL the document is fetched from.
    pub base_url: String,
}

impl Default for SampleClientConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://tools.learningcontainer.com/".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable `/admin/*` endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.routes, vec![RouteConfig::sample_proxy()]);
        assert_eq!(config.timeouts.upstream_secs, 10);
        assert!(config.graphql.enabled);
        assert!(!config.admin.enabled);
    }

    #[test]
    fn parses_route_tables() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"

            [[routes]]
            id = "users"
            path = "/users/{id}"
            methods = ["GET"]
            uri = "http://127.0.0.1:3000"
            set_path = "/v2/users/{id}"
            remove_response_headers = ["server"]

            [[routes.add_response_headers]]
            name = "x-gateway"
            value = "1"
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.routes.len(), 1);
        let route = &config.routes[0];
        assert_eq!(route.id, "users");
        assert_eq!(route.methods, vec!["GET".to_string()]);
        assert_eq!(route.set_path.as_deref(), Some("/v2/users/{id}"));
        assert_eq!(route.add_response_headers, vec![HeaderEntry::new("x-gateway", "1")]);
        assert_eq!(route.remove_response_headers, vec!["server".to_string()]);
        assert!(route.host.is_none());
    }
}
