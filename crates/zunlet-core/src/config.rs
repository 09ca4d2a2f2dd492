//! zunlet.toml configuration parser.
//!
//! ```toml
//! [node]
//! name = "virtual-zun"
//! operating_system = "Linux"
//! daemon_port = 10250
//!
//! [capacity]
//! cpu = "40"
//! memory = "200Gi"
//! pods = "50"
//!
//! [remote]
//! endpoint = "http://zun.example.com:9517/v1"
//! region = "RegionOne"
//! timeout_secs = 30
//! ```
//!
//! Every section is optional; unset capacity values fall back to
//! [`DEFAULT_CPU`], [`DEFAULT_MEMORY`] and [`DEFAULT_PODS`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::node::OPERATING_SYSTEM_LINUX;
use crate::quantity::Quantity;

pub const DEFAULT_NODE_NAME: &str = "virtual-zun";
pub const DEFAULT_DAEMON_PORT: i32 = 10250;
pub const DEFAULT_CPU: &str = "20";
pub const DEFAULT_MEMORY: &str = "100Gi";
pub const DEFAULT_PODS: &str = "20";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZunletConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_name")]
    pub name: String,
    #[serde(default = "default_operating_system")]
    pub operating_system: String,
    #[serde(default = "default_daemon_port")]
    pub daemon_port: i32,
}

/// Static capacity advertised for the virtual node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub pods: Option<String>,
}

/// Remote capsule API settings. Environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn default_node_name() -> String {
    DEFAULT_NODE_NAME.to_string()
}

fn default_operating_system() -> String {
    OPERATING_SYSTEM_LINUX.to_string()
}

fn default_daemon_port() -> i32 {
    DEFAULT_DAEMON_PORT
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: default_node_name(),
            operating_system: default_operating_system(),
            daemon_port: default_daemon_port(),
        }
    }
}

impl CapacityConfig {
    pub fn cpu(&self) -> Quantity {
        Quantity::new(self.cpu.as_deref().unwrap_or(DEFAULT_CPU))
    }

    pub fn memory(&self) -> Quantity {
        Quantity::new(self.memory.as_deref().unwrap_or(DEFAULT_MEMORY))
    }

    pub fn pods(&self) -> Quantity {
        Quantity::new(self.pods.as_deref().unwrap_or(DEFAULT_PODS))
    }
}

impl ZunletConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ZunletConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject capacity overrides that are not valid quantities, so the node
    /// facade never has to report a malformed value.
    pub fn validate(&self) -> anyhow::Result<()> {
        let capacity = &self.capacity;
        for (name, quantity) in [
            ("cpu", capacity.cpu()),
            ("memory", capacity.memory()),
            ("pods", capacity.pods()),
        ] {
            quantity
                .value()
                .map_err(|e| anyhow::anyhow!("invalid capacity.{name}: {e}"))?;
        }
        if self.node.name.is_empty() {
            anyhow::bail!("node.name must not be empty");
        }
        Ok(())
    }
}
