//! Gateway configuration

use std::time::Duration;

use rvi_core::EndpointScope;
use serde::{Deserialize, Serialize};

/// Settings for the correlation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// RVI host prefix of the target resources, e.g. `genivi.org`
    #[serde(default = "default_target_host")]
    pub target_host: String,
    /// How long a caller waits for a reply, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Resource-scoping prefix of the path schema
    #[serde(default)]
    pub scope: EndpointScope,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            target_host: default_target_host(),
            timeout_ms: default_timeout_ms(),
            scope: EndpointScope::default(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_target_host() -> String {
    "genivi.org".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}
