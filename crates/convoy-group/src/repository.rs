//! Durable storage abstraction for the group tree
//!
//! The repository owns the durable "current" snapshot. No transactional
//! guarantee is assumed beyond the single-writer discipline the manager
//! enforces; the in-memory implementation is suitable for development and
//! testing.

use async_trait::async_trait;
use convoy_types::Group;
use dashmap::DashMap;
use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable store for group trees, keyed by a fixed root key
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Load the current tree; `None` if nothing was ever stored
    async fn load(&self, key: &str) -> Result<Option<Group>, RepositoryError>;

    /// Store a tree and return the stored value, possibly after
    /// backend-side normalization
    async fn store(&self, key: &str, root: Group) -> Result<Group, RepositoryError>;
}

/// In-memory group repository
#[derive(Default)]
pub struct InMemoryGroupRepository {
    trees: DashMap<String, Group>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self {
            trees: DashMap::new(),
        }
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn load(&self, key: &str) -> Result<Option<Group>, RepositoryError> {
        Ok(self.trees.get(key).map(|t| t.clone()))
    }

    async fn store(&self, key: &str, root: Group) -> Result<Group, RepositoryError> {
        self.trees.insert(key.to_string(), root.clone());
        Ok(root)
    }
}
