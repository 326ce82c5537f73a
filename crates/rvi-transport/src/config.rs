//! Transport configuration

use rvi_core::EndpointScope;
use serde::{Deserialize, Serialize};

/// Address of the local RVI node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RviNodeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RviNodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl RviNodeConfig {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// In-process mock transport
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// Mock transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated delay before an echoed reply, in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Answer every call on the matching registered service
    #[serde(default = "default_echo")]
    pub echo: bool,
    /// Scope used to map addressed calls back to service names when echoing
    #[serde(default)]
    pub scope: EndpointScope,
    /// Keep every call for later inspection. Test use only; the record
    /// is never trimmed.
    #[serde(default)]
    pub record_calls: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            echo: true,
            scope: EndpointScope::default(),
            record_calls: false,
        }
    }
}

fn default_echo() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_node_defaults() {
        let node = RviNodeConfig::default();
        assert_eq!(node.address(), "localhost:5000");
    }

    #[test]
    fn test_transport_config_tagged() {
        let cfg: TransportConfig =
            serde_json::from_str(r#"{"type": "mock", "latency_ms": 25, "echo": false}"#).unwrap();
        assert_eq!(
            cfg,
            TransportConfig::Mock(MockConfig {
                latency_ms: 25,
                echo: false,
                scope: EndpointScope::default(),
                record_calls: false,
            })
        );
    }
}
