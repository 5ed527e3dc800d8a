//! The group tree - recursive desired-state container
//!
//! A `Group` aggregates apps and child groups under one identifier. Trees
//! are immutable values: every helper consumes the receiver and returns a
//! new tree, so pipeline stages never observe partial mutation.
//!
//! Apps are held by the group at their parent path: an app `/prod/db/redis`
//! lives in the group `/prod/db`. Child groups are keyed by their full path.

use crate::{AppDefinition, PathId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Internal tree node aggregating apps and child groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Identifier of this node
    pub id: PathId,

    /// Apps directly contained in this group, keyed by app id
    #[serde(default)]
    pub apps: BTreeMap<PathId, AppDefinition>,

    /// Child groups, keyed by their full path
    #[serde(default)]
    pub groups: BTreeMap<PathId, Group>,

    /// Version stamp of the transaction that produced this instance
    pub version: chrono::DateTime<chrono::Utc>,
}

impl Group {
    /// An empty group at the given path
    pub fn empty(id: PathId) -> Self {
        Self {
            id,
            apps: BTreeMap::new(),
            groups: BTreeMap::new(),
            version: chrono::Utc::now(),
        }
    }

    /// An empty root group
    pub fn root() -> Self {
        Self::empty(PathId::root())
    }

    /// True iff this group holds no apps and all children are empty
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.groups.values().all(Group::is_empty)
    }

    /// All apps reachable from this node, ordered by path
    pub fn transitive_apps(&self) -> Vec<&AppDefinition> {
        let mut apps: Vec<&AppDefinition> = Vec::new();
        self.collect_apps(&mut apps);
        apps.sort_by(|a, b| a.id.cmp(&b.id));
        apps
    }

    fn collect_apps<'a>(&'a self, out: &mut Vec<&'a AppDefinition>) {
        out.extend(self.apps.values());
        for child in self.groups.values() {
            child.collect_apps(out);
        }
    }

    /// Look up an app anywhere in the tree by its full path
    pub fn app(&self, id: &PathId) -> Option<&AppDefinition> {
        if let Some(app) = self.apps.get(id) {
            return Some(app);
        }
        self.groups
            .values()
            .find(|g| g.id.is_ancestor_of(id))
            .and_then(|g| g.app(id))
    }

    /// Look up a group anywhere in the tree by its full path
    pub fn group(&self, id: &PathId) -> Option<&Group> {
        if &self.id == id {
            return Some(self);
        }
        self.groups
            .values()
            .find(|g| g.id == *id || g.id.is_ancestor_of(id))
            .and_then(|g| g.group(id))
    }

    /// Insert or replace an app, creating intermediate groups along its path
    ///
    /// The app's id must be a strict descendant of this group's id.
    pub fn put_app(mut self, app: AppDefinition) -> Self {
        debug_assert!(self.id.is_ancestor_of(&app.id));
        let parent = app.id.parent().unwrap_or_else(PathId::root);
        if parent == self.id {
            self.apps.insert(app.id.clone(), app);
            return self;
        }
        let child_id = self.child_step(&app.id);
        let child = self
            .groups
            .remove(&child_id)
            .unwrap_or_else(|| Group::empty(child_id.clone()));
        self.groups.insert(child_id, child.put_app(app));
        self
    }

    /// Remove an app by path; absent ids are a no-op
    ///
    /// Emptied ancestor groups are left in place; pruning is a separate,
    /// explicit step.
    pub fn remove_app(mut self, id: &PathId) -> Self {
        if self.apps.remove(id).is_some() {
            return self;
        }
        if let Some(child_id) = self.groups.keys().find(|g| g.is_ancestor_of(id)).cloned() {
            let child = self.groups.remove(&child_id).unwrap();
            self.groups.insert(child_id, child.remove_app(id));
        }
        self
    }

    /// Insert or replace a child group, creating intermediate groups
    pub fn put_group(mut self, group: Group) -> Self {
        debug_assert!(self.id.is_ancestor_of(&group.id));
        let child_id = self.child_step(&group.id);
        if child_id == group.id {
            self.groups.insert(child_id, group);
            return self;
        }
        let child = self
            .groups
            .remove(&child_id)
            .unwrap_or_else(|| Group::empty(child_id.clone()));
        self.groups.insert(child_id, child.put_group(group));
        self
    }

    /// Remove a subtree by path; absent ids are a no-op
    pub fn remove_group(mut self, id: &PathId) -> Self {
        if self.groups.remove(id).is_some() {
            return self;
        }
        if let Some(child_id) = self.groups.keys().find(|g| g.is_ancestor_of(id)).cloned() {
            let child = self.groups.remove(&child_id).unwrap();
            self.groups.insert(child_id, child.remove_group(id));
        }
        self
    }

    /// Stamp this node with a new version
    pub fn with_version(mut self, version: chrono::DateTime<chrono::Utc>) -> Self {
        self.version = version;
        self
    }

    /// Drop empty child groups recursively; the receiver itself is retained
    ///
    /// Idempotent: pruning an already-pruned tree returns an identical tree.
    pub fn prune(mut self) -> Self {
        self.groups = self
            .groups
            .into_iter()
            .filter(|(_, g)| !g.is_empty())
            .map(|(id, g)| (id, g.prune()))
            .collect();
        self
    }

    /// Rebuild the tree applying `f` to every app
    pub fn map_apps<F>(mut self, f: &mut F) -> Self
    where
        F: FnMut(AppDefinition) -> AppDefinition,
    {
        self.apps = self
            .apps
            .into_iter()
            .map(|(id, app)| (id, f(app)))
            .collect();
        self.groups = self
            .groups
            .into_iter()
            .map(|(id, g)| (id, g.map_apps(f)))
            .collect();
        self
    }

    // The direct child path one segment below this group along `target`.
    fn child_step(&self, target: &PathId) -> PathId {
        self.id
            .append(target.segments()[self.id.segments().len()].clone())
    }
}
