//! Error types for the update pipeline

use crate::validate::Violation;
use thiserror::Error;

/// Errors surfaced to the caller of an update transaction
#[derive(Debug, Error)]
pub enum GroupError {
    /// The dynamic-port pool could not satisfy every request in one
    /// transaction. Nothing was persisted.
    #[error("dynamic port pool [{min_port}, {max_port}] exhausted")]
    PortExhausted { min_port: u16, max_port: u16 },

    /// The candidate tree failed validation. Nothing was persisted.
    #[error("constraint violations: {}", format_violations(.0))]
    ConstraintViolation(Vec<Violation>),

    /// The repository failed to persist the tree. No deployment was
    /// triggered.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The manager's worker is gone; no further transactions can run.
    #[error("update queue closed")]
    QueueClosed,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Scheduler dispatch failure. Reported through the event stream, never
/// through the caller's update result: by the time deployment is dispatched
/// the tree is already committed.
#[derive(Debug, Error)]
#[error("deployment dispatch failed: {0}")]
pub struct DeployError(pub String);

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, GroupError>;
