//! Event types for update-pipeline observability

use crate::Group;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all group events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// The actual event
    pub event: GroupEvent,
}

impl GroupEventEnvelope {
    pub fn new(event: GroupEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            event,
        }
    }
}

/// Events emitted by the group manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// A transaction committed a new tree
    GroupChanged {
        /// The stored root group
        root: Group,
    },

    /// The scheduler rejected or failed a deployment dispatch after the
    /// tree was already persisted; the commit stands
    DeploymentDispatchFailed {
        /// Version of the committed tree whose dispatch failed
        version: chrono::DateTime<chrono::Utc>,
        reason: String,
    },
}
