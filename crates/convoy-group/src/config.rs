//! Configuration for the group manager

use crate::error::{GroupError, Result};
use serde::{Deserialize, Serialize};

/// Bounds of the dynamic port pool, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    /// Lower bound of the dynamic pool
    #[serde(default = "default_min_port")]
    pub min_port: u16,

    /// Upper bound of the dynamic pool
    #[serde(default = "default_max_port")]
    pub max_port: u16,
}

fn default_min_port() -> u16 {
    10_000
}

fn default_max_port() -> u16 {
    20_000
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            min_port: default_min_port(),
            max_port: default_max_port(),
        }
    }
}

impl PortRange {
    pub fn new(min_port: u16, max_port: u16) -> Self {
        Self { min_port, max_port }
    }

    /// Check the bounds are usable
    pub fn validate(&self) -> Result<()> {
        if self.min_port == 0 {
            return Err(GroupError::Config("min_port must be > 0".into()));
        }
        if self.min_port > self.max_port {
            return Err(GroupError::Config(format!(
                "min_port {} exceeds max_port {}",
                self.min_port, self.max_port
            )));
        }
        Ok(())
    }

    pub fn contains(&self, port: u16) -> bool {
        port >= self.min_port && port <= self.max_port
    }

    /// Number of ports in the pool
    pub fn capacity(&self) -> usize {
        (self.max_port - self.min_port) as usize + 1
    }
}

/// Group manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupManagerConfig {
    /// Dynamic port pool
    #[serde(default)]
    pub port_range: PortRange,

    /// Capacity of the transaction queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Repository key under which the root tree is stored
    #[serde(default = "default_root_key")]
    pub root_key: String,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_root_key() -> String {
    "root".to_string()
}

impl Default for GroupManagerConfig {
    fn default() -> Self {
        Self {
            port_range: PortRange::default(),
            queue_capacity: default_queue_capacity(),
            root_key: default_root_key(),
        }
    }
}

impl GroupManagerConfig {
    pub fn validate(&self) -> Result<()> {
        self.port_range.validate()?;
        if self.queue_capacity == 0 {
            return Err(GroupError::Config("queue_capacity must be > 0".into()));
        }
        if self.root_key.is_empty() {
            return Err(GroupError::Config("root_key must not be empty".into()));
        }
        Ok(())
    }
}
