//! Deployment scheduler interface
//!
//! The scheduler receives the delta between the previously stored tree and
//! the newly committed one and places the work on the cluster. Dispatch is
//! decoupled from the caller's result: by the time it runs, the new tree is
//! already persisted.

use crate::error::DeployError;
use async_trait::async_trait;
use convoy_types::Group;
use tracing::debug;

/// Accepts a deployment request for an old -> new tree delta
#[async_trait]
pub trait DeploymentScheduler: Send + Sync {
    /// Dispatch a deployment for the delta between the two trees
    async fn deploy(&self, old: &Group, new: &Group) -> Result<(), DeployError>;
}

/// Scheduler that acknowledges every dispatch without placing work
///
/// Useful for development and for embedding the manager where deployment
/// is driven elsewhere.
pub struct NoopScheduler;

#[async_trait]
impl DeploymentScheduler for NoopScheduler {
    async fn deploy(&self, old: &Group, new: &Group) -> Result<(), DeployError> {
        debug!(
            old_version = %old.version,
            new_version = %new.version,
            "deployment dispatch skipped (noop scheduler)"
        );
        Ok(())
    }
}
