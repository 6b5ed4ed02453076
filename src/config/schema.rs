//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port, port reclaim).
    pub listener: ListenerConfig,

    /// Upstream origin settings.
    pub upstream: UpstreamConfig,

    /// Inbound routing and body settings.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,

    /// Kill any other process holding `port` before binding.
    pub reclaim_port: bool,
}

impl ListenerConfig {
    /// Socket address to bind. IPv6 hosts are given bare (`::`), without brackets.
    pub fn bind_address(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            reclaim_port: true,
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin every request is forwarded to (scheme + host, optional port).
    pub base_url: String,

    /// Deadline for the upstream response headers, in seconds.
    pub timeout_secs: u64,

    /// TCP/TLS connection establishment timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Inbound routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Path prefix whose requests are forwarded (no trailing slash).
    pub path_prefix: String,

    /// Largest inbound body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/v1".to_string(),
            max_body_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_built_in_behaviour() {
        let config = ProxyConfig::default();
        assert_eq!(
            config.listener.bind_address().unwrap().to_string(),
            "0.0.0.0:8080"
        );
        assert!(config.listener.reclaim_port);
        assert_eq!(config.upstream.base_url, "https://api.openai.com");
        assert_eq!(config.upstream.timeout(), Duration::from_secs(30));
        assert_eq!(config.forwarding.path_prefix, "/v1");
    }

    #[test]
    fn ipv6_host_forms_a_bracketed_socket_address() {
        let listener = ListenerConfig {
            host: "::".to_string(),
            port: 8080,
            reclaim_port: false,
        };
        let addr = listener.bind_address().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.to_string(), "[::]:8080");
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 9000

            [upstream]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.base_url, "https://api.openai.com");
        assert_eq!(config.forwarding, ForwardingConfig::default());
    }

    #[test]
    fn empty_toml_is_default() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProxyConfig::default());
    }
}
