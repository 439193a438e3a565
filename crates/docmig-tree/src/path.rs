//! Structural paths for addressing elements within a document
//!
//! Provides [`StructuralPath`], a chain of `(name, occurrence-index)` pairs.
//!
//! # Format
//! - `/object/items/item[2]`: anchored at the document root
//! - `items/item[2]/value`: relative to some element
//! - an index of 0 is implied when `[index]` is absent and omitted when
//!   rendering, so `/a/b` and `/a[0]/b[0]` are the same path
//!
//! A rendered path is a snapshot: after the tree changes it is only good for
//! comparison against other path strings.

use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a structural path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathSegment {
    name: String,
    index: usize,
}

impl PathSegment {
    /// Create segment
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Occurrence index among same-named element siblings (0-based)
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.index > 0 {
            write!(f, "{}[{}]", self.name, self.index)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl FromStr for PathSegment {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::EmptySegment);
        }

        let (name, index) = match s.find('[') {
            Some(open) => {
                let rest = &s[open + 1..];
                let digits = rest
                    .strip_suffix(']')
                    .ok_or_else(|| PathError::UnclosedBracket(s.to_string()))?;
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidIndex(s.to_string()))?;
                (&s[..open], index)
            }
            None => (s, 0),
        };

        if name.is_empty() {
            return Err(PathError::EmptyName(s.to_string()));
        }
        if name.contains(']') {
            return Err(PathError::InvalidIndex(s.to_string()));
        }

        Ok(Self::new(name, index))
    }
}

/// Path of an element, from the root or from some other element
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StructuralPath {
    segments: SmallVec<[PathSegment; 8]>,
    anchored: bool,
}

impl StructuralPath {
    /// Relative path from segments
    #[inline]
    #[must_use]
    pub fn relative(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            anchored: false,
        }
    }

    /// Root-anchored path from segments
    #[inline]
    #[must_use]
    pub fn absolute(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            anchored: true,
        }
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if path starts at the document root
    #[inline]
    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path without its last segment
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut parent = self.clone();
        parent.segments.pop();
        Some(parent)
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn child(&self, name: impl Into<String>, index: usize) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::new(name, index));
        new
    }

    /// Check if this path is a prefix of another (same anchoring)
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.anchored == other.anchored
            && self.segments.len() <= other.segments.len()
            && self.segments[..] == other.segments[..self.segments.len()]
    }
}

impl Display for StructuralPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.anchored {
            f.write_str("/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for StructuralPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (anchored, body) = match s.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if body.is_empty() {
            return Ok(Self {
                segments: SmallVec::new(),
                anchored,
            });
        }

        let segments = body
            .split('/')
            .map(PathSegment::from_str)
            .collect::<Result<SmallVec<_>, _>>()?;

        Ok(Self { segments, anchored })
    }
}

/// Errors from parsing path expressions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment (`a//b`)
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment with an index but no name (`[1]`)
    #[error("segment has no name: {0}")]
    EmptyName(String),

    /// Index is not a non-negative integer
    #[error("invalid index in segment: {0}")]
    InvalidIndex(String),

    /// `[` without a closing `]` at the end of the segment
    #[error("unclosed bracket in segment: {0}")]
    UnclosedBracket(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_relative() {
        let path: StructuralPath = "a/b[1]/c".parse().unwrap();
        assert!(!path.is_anchored());
        assert_eq!(
            path.segments(),
            &[
                PathSegment::new("a", 0),
                PathSegment::new("b", 1),
                PathSegment::new("c", 0)
            ]
        );
    }

    #[test]
    fn parse_anchored() {
        let path: StructuralPath = "/object/item[2]".parse().unwrap();
        assert!(path.is_anchored());
        assert_eq!(path.len(), 2);
        assert_eq!(path.last().map(PathSegment::index), Some(2));
    }

    #[test]
    fn zero_index_is_omitted() {
        let path: StructuralPath = "/a[0]/b[0]".parse().unwrap();
        assert_eq!(path.to_string(), "/a/b");
        assert_eq!(path, "/a/b".parse().unwrap());
    }

    #[test]
    fn empty_expression_is_empty_relative_path() {
        let path: StructuralPath = "".parse().unwrap();
        assert!(path.is_empty());
        assert!(!path.is_anchored());
    }

    #[test]
    fn malformed_segments() {
        assert_eq!("a//b".parse::<StructuralPath>(), Err(PathError::EmptySegment));
        assert_eq!(
            "a/[1]".parse::<StructuralPath>(),
            Err(PathError::EmptyName("[1]".into()))
        );
        assert_eq!(
            "a/b[x]".parse::<StructuralPath>(),
            Err(PathError::InvalidIndex("b[x]".into()))
        );
        assert_eq!(
            "a/b[1".parse::<StructuralPath>(),
            Err(PathError::UnclosedBracket("b[1".into()))
        );
        assert_eq!(
            "a/b[-1]".parse::<StructuralPath>(),
            Err(PathError::InvalidIndex("b[-1]".into()))
        );
    }

    #[test]
    fn parent_and_child() {
        let path: StructuralPath = "/a/b[3]".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "/a");
        assert_eq!(path.child("c", 1).to_string(), "/a/b[3]/c[1]");
        assert!(StructuralPath::default().parent().is_none());
    }

    #[test]
    fn prefix_respects_anchoring() {
        let a: StructuralPath = "/a/b".parse().unwrap();
        let b: StructuralPath = "/a/b/c".parse().unwrap();
        let rel: StructuralPath = "a/b".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(!rel.is_prefix_of(&b));
    }
}
