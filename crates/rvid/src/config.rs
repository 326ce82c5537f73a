//! Daemon configuration
//!
//! Built-in defaults, overlaid by an optional TOML file, overlaid by
//! environment variables. Read once at startup.
//!
//! ```toml
//! [server]
//! port = 8001
//!
//! [rvi]
//! host = "localhost"
//! port = 5000
//! target_host = "genivi.org"
//! timeout_ms = 30000
//!
//! [transport]
//! type = "mock"
//! latency_ms = 50
//!
//! [[paths]]
//! template = "/vehicles/{id}/odometer"
//! methods = ["get"]
//! ```

use std::path::{Path, PathBuf};

use rvi_api::{PathEntry, PathSchema, SchemaError};
use rvi_core::EndpointScope;
use rvi_gateway::GatewayConfig;
use rvi_transport::{RviNodeConfig, TransportConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading the daemon configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid path schema: {0}")]
    Schema(#[from] SchemaError),
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub rvi: RviConfig,

    /// Transport backend
    #[serde(default)]
    pub transport: TransportConfig,

    /// Inline path schema
    #[serde(default)]
    pub paths: Option<Vec<PathEntry>>,

    /// OpenAPI document supplying the path schema; takes precedence over `paths`
    #[serde(default)]
    pub schema: Option<PathBuf>,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

fn default_server_port() -> u16 {
    8001
}

/// RVI node and correlation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RviConfig {
    /// Local RVI node
    #[serde(flatten)]
    pub node: RviNodeConfig,

    #[serde(default = "default_target_host")]
    pub target_host: String,

    /// Reply timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub scope: EndpointScope,
}

impl Default for RviConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            node: RviNodeConfig::default(),
            target_host: gateway.target_host,
            timeout_ms: gateway.timeout_ms,
            scope: gateway.scope,
        }
    }
}

fn default_target_host() -> String {
    GatewayConfig::default().target_host
}

fn default_timeout_ms() -> u64 {
    GatewayConfig::default().timeout_ms
}

impl DaemonConfig {
    /// Load defaults, the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables, read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_env("PORT", value)?;
        }
        if let Some(value) = lookup("RVI_HOST") {
            self.rvi.node.host = value;
        }
        if let Some(value) = lookup("RVI_PORT") {
            self.rvi.node.port = parse_env("RVI_PORT", value)?;
        }
        if let Some(value) = lookup("RVI_TARGET_HOST") {
            self.rvi.target_host = value;
        }
        if let Some(value) = lookup("RVI_TIMEOUT_MS") {
            self.rvi.timeout_ms = parse_env("RVI_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("RVI_SCHEMA") {
            self.schema = Some(PathBuf::from(value));
        }
        Ok(())
    }

    pub fn node(&self) -> &RviNodeConfig {
        &self.rvi.node
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            target_host: self.rvi.target_host.clone(),
            timeout_ms: self.rvi.timeout_ms,
            scope: self.rvi.scope.clone(),
        }
    }

    /// Transport config with the mock echo scope aligned to the gateway's
    pub fn transport(&self) -> TransportConfig {
        match &self.transport {
            TransportConfig::Mock(mock) => {
                let mut mock = mock.clone();
                mock.scope = self.rvi.scope.clone();
                TransportConfig::Mock(mock)
            }
        }
    }

    /// Path schema from the OpenAPI file, the inline `paths`, or the
    /// built-in vehicle schema
    pub fn path_schema(&self) -> Result<PathSchema, ConfigError> {
        if let Some(path) = &self.schema {
            return Ok(PathSchema::from_openapi(&read(path)?)?);
        }
        match &self.paths {
            Some(entries) => Ok(PathSchema::new(entries.clone())?),
            None => Ok(PathSchema::vehicle_default()),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
