//! Convoy Group - serialized update pipeline over the desired-state tree
//!
//! This crate owns the update transaction pipeline of the orchestrator's
//! desired state: it serializes concurrent callers through a single worker,
//! resolves dynamic port requests into concrete values, validates the
//! candidate tree, prunes emptied groups, persists the result, and hands the
//! delta to the deployment scheduler.
//!
//! ## Architectural Boundaries
//!
//! - `convoy-types` owns: the tree data model (paths, apps, groups, events)
//! - `convoy-group` owns: transaction ordering, port allocation, validation
//!   gating, pruning, persistence sequencing
//! - The repository, scheduler, and validator are consumed through traits;
//!   this crate ships in-memory/no-op implementations for development and
//!   testing.
//!
//! ## Usage
//!
//! ```no_run
//! use convoy_group::{
//!     GroupManager, GroupManagerConfig, InMemoryGroupRepository, NoopScheduler,
//!     StructuralValidator,
//! };
//! use convoy_types::{AppDefinition, PathId};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = GroupManager::new(
//!     Arc::new(InMemoryGroupRepository::new()),
//!     Arc::new(StructuralValidator),
//!     Arc::new(NoopScheduler),
//!     GroupManagerConfig::default(),
//! )?;
//!
//! let app = AppDefinition::new(PathId::parse("/prod/web")?).with_ports(vec![0, 443]);
//! let stored = manager.update(move |root| root.put_app(app)).await?;
//! assert!(stored.transitive_apps().iter().all(|a| !a.has_dynamic_port()));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod manager;
pub mod ports;
pub mod repository;
pub mod scheduler;
pub mod validate;

// Re-exports
pub use config::{GroupManagerConfig, PortRange};
pub use error::{DeployError, GroupError, Result};
pub use manager::{GroupManager, Transform};
pub use ports::assign_dynamic_ports;
pub use repository::{GroupRepository, InMemoryGroupRepository, RepositoryError};
pub use scheduler::{DeploymentScheduler, NoopScheduler};
pub use validate::{AllowAllValidator, GroupValidator, StructuralValidator, Violation};
