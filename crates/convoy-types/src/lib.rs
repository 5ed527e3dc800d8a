//! Convoy Types - Core types for desired-state group management
//!
//! Convoy holds a hierarchical tree of deployable app definitions ("groups")
//! and applies update transactions against it. This crate is the pure data
//! model shared by the pipeline and its collaborators.
//!
//! ## Key Concepts
//!
//! - **PathId**: slash-delimited hierarchical identifier for apps and groups
//! - **AppDefinition**: a leaf deployable unit with requested ports and an
//!   optional container spec
//! - **Group**: recursive tree node aggregating apps and child groups
//! - **Events**: observability stream emitted on committed updates
//!
//! Trees are immutable values: helpers on [`Group`] consume the receiver and
//! return a new tree, so no pipeline stage ever sees partial mutation.

#![deny(unsafe_code)]

pub mod app;
pub mod events;
pub mod group;
pub mod ids;

// Re-export main types
pub use app::{AppDefinition, Container, PortMapping, Protocol};
pub use events::{GroupEvent, GroupEventEnvelope};
pub use group::Group;
pub use ids::{PathError, PathId};
