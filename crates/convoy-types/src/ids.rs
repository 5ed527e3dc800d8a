//! Hierarchical path identifiers
//!
//! A `PathId` locates an app or group inside the desired-state tree. Paths
//! are slash-delimited; the root group is the empty path, rendered as `/`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when parsing a path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path contains an empty segment: {0:?}")]
    EmptySegment(String),

    #[error("the root path has no parent")]
    RootHasNoParent,
}

/// Slash-delimited hierarchical identifier for apps and groups
///
/// Ordering is lexicographic over the segment sequence, which gives a total
/// order across the whole tree. Parents sort before their descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId {
    segments: Vec<String>,
}

impl PathId {
    /// The root path (empty segment sequence)
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse a path from its string form, e.g. `/prod/db/redis`
    ///
    /// Leading and trailing slashes are accepted; interior empty segments
    /// are rejected.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let trimmed = input.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(input.to_string()));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// True for the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path's segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Drop the last segment; `None` at the root
    pub fn parent(&self) -> Option<PathId> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Extend this path with one more segment
    pub fn append(&self, segment: impl Into<String>) -> PathId {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// True iff `other` is a strict descendant of `self`
    ///
    /// The root is an ancestor of every non-root path; no path is its own
    /// ancestor.
    pub fn is_ancestor_of(&self, other: &PathId) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for PathId {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PathId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let id = PathId::parse("/prod/db/redis").unwrap();
        assert_eq!(id.segments(), ["prod", "db", "redis"]);
        assert_eq!(id.to_string(), "/prod/db/redis");
        assert_eq!(PathId::parse("prod/db/").unwrap().to_string(), "/prod/db");
    }

    #[test]
    fn root_is_empty() {
        let root = PathId::parse("/").unwrap();
        assert!(root.is_root());
        assert_eq!(root, PathId::root());
        assert_eq!(root.to_string(), "/");
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(matches!(
            PathId::parse("/a//b"),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn parent_drops_last_segment() {
        let id = PathId::parse("/a/b/c").unwrap();
        assert_eq!(id.parent(), Some(PathId::parse("/a/b").unwrap()));
        assert_eq!(PathId::parse("/a").unwrap().parent(), Some(PathId::root()));
    }

    #[test]
    fn ancestry_is_strict() {
        let root = PathId::root();
        let a = PathId::parse("/a").unwrap();
        let ab = PathId::parse("/a/b").unwrap();
        let ax = PathId::parse("/ax").unwrap();

        assert!(root.is_ancestor_of(&a));
        assert!(a.is_ancestor_of(&ab));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&ax));
        assert!(!ab.is_ancestor_of(&a));
    }

    #[test]
    fn ordering_is_total_over_segments() {
        let mut ids = vec![
            PathId::parse("/b").unwrap(),
            PathId::parse("/a/c").unwrap(),
            PathId::parse("/a").unwrap(),
            PathId::root(),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        assert_eq!(rendered, ["/", "/a", "/a/c", "/b"]);
    }

    #[test]
    fn serde_uses_string_form() {
        let id = PathId::parse("/a/b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"/a/b\"");
        let back: PathId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
