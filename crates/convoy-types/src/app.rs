//! App definitions - the leaf deployable units of the tree
//!
//! An `AppDefinition` describes one deployable unit: its identity, the ports
//! it wants exposed, and an optional container spec with explicit port
//! mappings. A port value of `0` is the "assign dynamically" sentinel; the
//! allocator replaces every sentinel with a concrete port before a tree is
//! ever persisted.

use crate::PathId;
use serde::{Deserialize, Serialize};

/// Transport protocol for a port mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

/// A container-level binding of an internal port to host and service ports
///
/// `host_port == 0` or `service_port == 0` request dynamic assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port the process listens on inside the container
    pub container_port: u16,

    /// Host-visible port; 0 = assign dynamically
    #[serde(default)]
    pub host_port: u16,

    /// Stable service-discovery port; 0 = assign dynamically
    #[serde(default)]
    pub service_port: u16,

    /// Transport protocol
    #[serde(default)]
    pub protocol: Protocol,
}

impl PortMapping {
    /// A mapping that requests dynamic host and service ports
    pub fn dynamic(container_port: u16) -> Self {
        Self {
            container_port,
            host_port: 0,
            service_port: 0,
            protocol: Protocol::Tcp,
        }
    }
}

/// Container specification for an app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Image reference
    pub image: String,

    /// Explicit port mappings; may be empty
    #[serde(default)]
    pub port_mappings: Vec<PortMapping>,
}

impl Container {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            port_mappings: Vec::new(),
        }
    }

    pub fn with_mappings(mut self, mappings: Vec<PortMapping>) -> Self {
        self.port_mappings = mappings;
        self
    }
}

/// A single deployable unit within the group tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDefinition {
    /// Identifier, unique across the entire tree
    pub id: PathId,

    /// Requested ports; 0 = assign dynamically
    #[serde(default)]
    pub ports: Vec<u16>,

    /// Optional container spec
    #[serde(default)]
    pub container: Option<Container>,

    /// Desired instance count
    #[serde(default = "default_instances")]
    pub instances: u32,

    /// Version stamp of the transaction that produced this definition
    pub version: chrono::DateTime<chrono::Utc>,
}

fn default_instances() -> u32 {
    1
}

impl AppDefinition {
    /// Create an app with no ports and no container
    pub fn new(id: PathId) -> Self {
        Self {
            id,
            ports: Vec::new(),
            container: None,
            instances: 1,
            version: chrono::Utc::now(),
        }
    }

    /// Builder-style port list
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    /// Builder-style container spec
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Port mappings of the container, if any
    pub fn port_mappings(&self) -> &[PortMapping] {
        self.container
            .as_ref()
            .map(|c| c.port_mappings.as_slice())
            .unwrap_or(&[])
    }

    /// True iff any port on this app still awaits dynamic assignment
    pub fn has_dynamic_port(&self) -> bool {
        self.ports.contains(&0) || self.port_mappings().iter().any(|m| m.host_port == 0)
    }

    /// Host ports published by the container mappings
    pub fn host_ports(&self) -> Vec<u16> {
        self.port_mappings().iter().map(|m| m.host_port).collect()
    }

    /// Service ports published by the container mappings
    pub fn service_ports(&self) -> Vec<u16> {
        self.port_mappings().iter().map(|m| m.service_port).collect()
    }
}
