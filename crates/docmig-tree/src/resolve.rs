//! Single-result path lookups
//!
//! Two accessors with deliberately different failure behavior:
//! - [`resolve_single`] returns `None` for anything it cannot resolve,
//!   including malformed expressions, so callers can probe optional structure
//! - [`resolve_single_or_fail`] reports a [`ResolveError`] for rules that
//!   require the structure to exist and must not fall back to a default

use crate::document::Document;
use crate::node::NodeId;
use crate::path::{PathError, StructuralPath};

/// Errors from the failing resolver
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Expression is not a valid path
    #[error("invalid path expression '{expr}': {source}")]
    Malformed {
        expr: String,
        #[source]
        source: PathError,
    },

    /// Expression is valid but addresses nothing
    #[error("path '{expr}' does not resolve from {from}")]
    NotFound { expr: String, from: String },
}

/// Resolve a parsed path against `from`
///
/// Each segment narrows to the `index`-th element child with that name. An
/// anchored path ignores `from` and starts at the root, whose name must
/// match the first segment (and whose index must be 0).
#[must_use]
pub fn resolve_path(doc: &Document, from: NodeId, path: &StructuralPath) -> Option<NodeId> {
    let mut segments = path.segments().iter();
    let mut current = if path.is_anchored() {
        let first = segments.next()?;
        let root = doc.root();
        if doc.name(root) != Some(first.name()) || first.index() != 0 {
            return None;
        }
        root
    } else {
        doc.element(from)?;
        from
    };

    for segment in segments {
        current = doc
            .children(current)
            .iter()
            .copied()
            .filter(|&c| doc.name(c) == Some(segment.name()))
            .nth(segment.index())?;
    }

    Some(current)
}

/// Resolve `expr` against `from` to at most one element; never fails
#[must_use]
pub fn resolve_single(doc: &Document, from: NodeId, expr: &str) -> Option<NodeId> {
    let path: StructuralPath = expr.parse().ok()?;
    resolve_path(doc, from, &path)
}

/// Resolve `expr` against `from`, treating absence as an error
///
/// # Errors
/// - `ResolveError::Malformed` if `expr` is not a valid path
/// - `ResolveError::NotFound` if any segment does not resolve
pub fn resolve_single_or_fail(
    doc: &Document,
    from: NodeId,
    expr: &str,
) -> Result<NodeId, ResolveError> {
    let path: StructuralPath = expr.parse().map_err(|source| ResolveError::Malformed {
        expr: expr.to_string(),
        source,
    })?;
    resolve_path(doc, from, &path).ok_or_else(|| ResolveError::NotFound {
        expr: expr.to_string(),
        from: doc.compute_path(from).to_string(),
    })
}
