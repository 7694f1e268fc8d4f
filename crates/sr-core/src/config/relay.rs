//! Relay daemon configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::{duration_secs, option_duration_secs};

/// What happens to the shared SSH session when a client detaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachPolicy {
    /// Tear down only once no client remains attached
    #[default]
    LastClient,
    /// Tear down whenever any client detaches
    AnyClient,
}

/// Configuration for the relay daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket server binds to
    pub bind_address: String,

    /// Upper bound on the SSH handshake and authentication
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Upper bound on a single remote command; unbounded when absent
    #[serde(with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<Duration>,

    /// How often the liveness monitor checks the SSH connection
    #[serde(with = "duration_secs")]
    pub liveness_interval: Duration,

    /// Session teardown rule on client disconnect
    pub detach_policy: DetachPolicy,

    /// Browser origins allowed to call the HTTP endpoints
    pub allowed_origins: Vec<String>,

    /// Map command aliases to real commands before execution
    pub translate_aliases: bool,

    /// Expected SSH host key fingerprint; a mismatch is logged
    pub host_key_fingerprint: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            connect_timeout: Duration::from_secs(30),
            command_timeout: None,
            liveness_interval: Duration::from_secs(5),
            detach_policy: DetachPolicy::default(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            translate_aliases: true,
            host_key_fingerprint: None,
        }
    }
}

impl RelayConfig {
    /// Replace the port of the bind address
    ///
    /// The host part is kept as written, so hostnames and bracketed IPv6
    /// literals survive. An address without a port gets one appended.
    pub fn with_port(mut self, port: u16) -> Self {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, tail)) if !host.is_empty() && !tail.contains(']') => host,
            _ => self.bind_address.as_str(),
        };
        self.bind_address = format!("{}:{}", host, port);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.detach_policy, DetachPolicy::LastClient);
        assert!(config.command_timeout.is_none());
        assert!(config.translate_aliases);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            bind_address = "127.0.0.1:8080"
            command_timeout = 15
            detach_policy = "any_client"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.command_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.detach_policy, DetachPolicy::AnyClient);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_with_port() {
        let config = RelayConfig::default().with_port(4000);
        assert_eq!(config.bind_address, "0.0.0.0:4000");
    }

    #[test]
    fn test_with_port_keeps_hostname() {
        let config = RelayConfig {
            bind_address: "localhost:3000".to_string(),
            ..Default::default()
        };
        assert_eq!(config.with_port(8080).bind_address, "localhost:8080");
    }

    #[test]
    fn test_with_port_ipv6_and_bare_host() {
        let config = RelayConfig {
            bind_address: "[::1]:3000".to_string(),
            ..Default::default()
        };
        assert_eq!(config.with_port(8080).bind_address, "[::1]:8080");

        let config = RelayConfig {
            bind_address: "relay.internal".to_string(),
            ..Default::default()
        };
        assert_eq!(config.with_port(8080).bind_address, "relay.internal:8080");

        let config = RelayConfig {
            bind_address: "[::1]".to_string(),
            ..Default::default()
        };
        assert_eq!(config.with_port(8080).bind_address, "[::1]:8080");
    }
}
