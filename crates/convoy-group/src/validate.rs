//! Tree validation - constraint checking before persistence
//!
//! The tree structure itself cannot enforce cross-subtree invariants (two
//! sibling groups could each hold an app with the same id), so those checks
//! live here and run once per transaction, after port allocation and before
//! the store call.

use async_trait::async_trait;
use convoy_types::{Group, PathId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One violated constraint, tied to the path that violated it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path of the offending app or group
    pub path: PathId,

    /// Human-readable description of the violated constraint
    pub constraint: String,
}

impl Violation {
    pub fn new(path: PathId, constraint: impl Into<String>) -> Self {
        Self {
            path,
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.constraint)
    }
}

/// Constraint checker invoked on the candidate tree after port allocation
///
/// Any violation aborts the transaction before persistence.
#[async_trait]
pub trait GroupValidator: Send + Sync {
    /// Check the tree; return every violated constraint, not just the first
    async fn validate(&self, root: &Group) -> Result<(), Vec<Violation>>;
}

/// Validator that accepts every tree
pub struct AllowAllValidator;

#[async_trait]
impl GroupValidator for AllowAllValidator {
    async fn validate(&self, _root: &Group) -> Result<(), Vec<Violation>> {
        Ok(())
    }
}

/// Default validator: structural well-formedness plus global id uniqueness
///
/// Checks:
/// - app ids are unique across the entire tree, not just within one group
/// - every child group's id is a strict descendant of its parent's id
/// - every app's id is a strict descendant of its enclosing group's id
/// - app ids are never the root path
/// - apps request at least one instance
pub struct StructuralValidator;

#[async_trait]
impl GroupValidator for StructuralValidator {
    async fn validate(&self, root: &Group) -> Result<(), Vec<Violation>> {
        let mut violations = Vec::new();
        let mut seen_apps: HashSet<&PathId> = HashSet::new();
        check_group(root, &mut seen_apps, &mut violations);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_group<'a>(
    group: &'a Group,
    seen_apps: &mut HashSet<&'a PathId>,
    violations: &mut Vec<Violation>,
) {
    for (key, app) in &group.apps {
        if key != &app.id {
            violations.push(Violation::new(
                key.clone(),
                format!("app keyed under {} but defines id {}", key, app.id),
            ));
        }
        if app.id.is_root() {
            violations.push(Violation::new(app.id.clone(), "app id must not be the root path"));
        } else if !group.id.is_ancestor_of(&app.id) {
            violations.push(Violation::new(
                app.id.clone(),
                format!("app is not a descendant of its group {}", group.id),
            ));
        }
        if app.instances == 0 {
            violations.push(Violation::new(app.id.clone(), "instances must be > 0"));
        }
        if !seen_apps.insert(&app.id) {
            violations.push(Violation::new(
                app.id.clone(),
                "app id is not unique across the tree",
            ));
        }
    }

    for (key, child) in &group.groups {
        if key != &child.id {
            violations.push(Violation::new(
                key.clone(),
                format!("group keyed under {} but defines id {}", key, child.id),
            ));
        }
        if !group.id.is_ancestor_of(&child.id) {
            violations.push(Violation::new(
                child.id.clone(),
                format!("group is not a descendant of its parent {}", group.id),
            ));
        }
        check_group(child, seen_apps, violations);
    }
}
