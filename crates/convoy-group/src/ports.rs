//! Dynamic port allocation over a candidate tree
//!
//! Pure function: given a candidate tree and the configured pool, returns a
//! new tree with every dynamic-port sentinel (`0`) resolved to a concrete
//! port, or fails with [`GroupError::PortExhausted`] without producing a
//! partial tree.
//!
//! Every port explicitly fixed anywhere in the candidate - app-level entries
//! as well as mapping-level host and service ports - is excluded from the
//! pool up front. Two unrelated apps must never end up publishing the same
//! host port on a shared set of agents.

use crate::config::PortRange;
use crate::error::{GroupError, Result};
use convoy_types::{AppDefinition, Group, PathId};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Resolve every dynamic port request in `candidate` from `range`
///
/// Traversal is deterministic (path order, then declaration order within an
/// app), so equal inputs always produce equal outputs. Explicitly assigned
/// ports are never altered, even when they fall inside the pool.
pub fn assign_dynamic_ports(candidate: &Group, range: &PortRange) -> Result<Group> {
    range.validate()?;

    let mut pool = PortPool::new(range, reserved_ports(candidate));
    let mut resolved: BTreeMap<PathId, AppDefinition> = BTreeMap::new();

    for app in candidate.transitive_apps() {
        resolved.insert(app.id.clone(), resolve_app(app, &mut pool)?);
    }

    debug!(
        apps = resolved.len(),
        min_port = range.min_port,
        max_port = range.max_port,
        "dynamic ports resolved"
    );

    Ok(candidate
        .clone()
        .map_apps(&mut |app| resolved.remove(&app.id).unwrap_or(app)))
}

fn resolve_app(app: &AppDefinition, pool: &mut PortPool) -> Result<AppDefinition> {
    let mut app = app.clone();

    match app.container.as_mut() {
        Some(container) if !container.port_mappings.is_empty() => {
            for mapping in container.port_mappings.iter_mut() {
                if mapping.host_port == 0 {
                    let port = pool.take()?;
                    mapping.host_port = port;
                    mapping.service_port = port;
                } else if mapping.service_port == 0 {
                    // The host port is explicit and stays; only the
                    // service port is drawn from the pool.
                    mapping.service_port = pool.take()?;
                }
            }
            // Mappings are authoritative: the app's port list mirrors the
            // container's published host ports.
            app.ports = container.port_mappings.iter().map(|m| m.host_port).collect();
        }
        _ => {
            // No mappings: resolve the app-level port list; a mapping-less
            // container passes through unmodified.
            for port in app.ports.iter_mut() {
                if *port == 0 {
                    *port = pool.take()?;
                }
            }
        }
    }

    Ok(app)
}

/// Every concrete port already claimed anywhere in the tree
fn reserved_ports(root: &Group) -> HashSet<u16> {
    let mut reserved = HashSet::new();
    for app in root.transitive_apps() {
        reserved.extend(app.ports.iter().copied().filter(|p| *p != 0));
        for mapping in app.port_mappings() {
            if mapping.host_port != 0 {
                reserved.insert(mapping.host_port);
            }
            if mapping.service_port != 0 {
                reserved.insert(mapping.service_port);
            }
        }
    }
    reserved
}

// Ascending scan over the pool; reserved ports are skipped and every pick
// is reserved in turn, so "smallest unused" never goes backwards.
struct PortPool {
    next: u32,
    min_port: u16,
    max_port: u16,
    reserved: HashSet<u16>,
}

impl PortPool {
    fn new(range: &PortRange, reserved: HashSet<u16>) -> Self {
        Self {
            next: range.min_port as u32,
            min_port: range.min_port,
            max_port: range.max_port,
            reserved,
        }
    }

    fn take(&mut self) -> Result<u16> {
        while self.next <= self.max_port as u32 {
            let port = self.next as u16;
            self.next += 1;
            if self.reserved.insert(port) {
                return Ok(port);
            }
        }
        Err(GroupError::PortExhausted {
            min_port: self.min_port,
            max_port: self.max_port,
        })
    }
}
