//! docmig migration context
//!
//! The old-path to new-path table built by the collect phase and consulted
//! by the mutate phase when rewriting `ref` attributes.
//!
//! # Core Concepts
//!
//! - [`MigrationContext`]: Ordered table of [`PathMapping`]s; lookups are
//!   linear and the first recorded entry for an old path wins
//! - Local mappings: sibling shifts a document undergoes as a side effect of
//!   its own rules. Only that document resolves through them; other
//!   documents in the batch never see them
//! - [`ContextScope`]: Whether one table is shared by every document in a
//!   batch or each document only sees its own entries
//!
//! Paths are stored as rendered strings. They are only compared, never
//! resolved, so entries stay meaningful after the tree they came from has
//! been rewritten.
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_context::MigrationContext;
//!
//! let mut ctx = MigrationContext::new();
//! ctx.record("/object/wrapper", "/object/payload");
//! assert_eq!(ctx.resolve("/object/wrapper"), Some("/object/payload"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recorded path change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    old: String,
    new: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    #[serde(default)]
    local: bool,
}

impl PathMapping {
    /// Path before migration
    #[inline]
    #[must_use]
    pub fn old(&self) -> &str {
        &self.old
    }

    /// Path after migration
    #[inline]
    #[must_use]
    pub fn new_path(&self) -> &str {
        &self.new
    }

    /// Document the mapping was recorded from, if known
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Check if only the origin document resolves through this mapping
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.local
    }

    fn visible_to(&self, document_id: &str) -> bool {
        !self.local || self.origin.as_deref() == Some(document_id)
    }
}

/// Reference table for one batch run
///
/// Append-only while collecting; read-only once the mutate phase starts.
/// Old paths are expected to be unique within a batch; if one is recorded
/// twice the first entry wins (see [`MigrationContext::duplicates`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationContext {
    entries: Vec<PathMapping>,
}

impl MigrationContext {
    /// Create empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path change
    pub fn record(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.entries.push(PathMapping {
            old: old.into(),
            new: new.into(),
            origin: None,
            local: false,
        });
    }

    /// Record a path change attributed to a document
    pub fn record_from(
        &mut self,
        origin: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) {
        self.entries.push(PathMapping {
            old: old.into(),
            new: new.into(),
            origin: Some(origin.into()),
            local: false,
        });
    }

    /// Record a path change only `origin` itself resolves through
    pub fn record_local(
        &mut self,
        origin: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) {
        self.entries.push(PathMapping {
            old: old.into(),
            new: new.into(),
            origin: Some(origin.into()),
            local: true,
        });
    }

    /// New path recorded for `old` (exact match, first entry wins)
    ///
    /// Local mappings are included regardless of origin; use
    /// [`resolve_for`](Self::resolve_for) when rewriting a document.
    #[must_use]
    pub fn resolve(&self, old: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.old == old)
            .map(|m| m.new.as_str())
    }

    /// New path for `old` as seen from `document_id`
    ///
    /// Skips local mappings recorded by other documents.
    #[must_use]
    pub fn resolve_for(&self, document_id: &str, old: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.old == old && m.visible_to(document_id))
            .map(|m| m.new.as_str())
    }

    /// Append every entry of `other`, keeping its order
    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Concatenate per-document contexts in the given order
    #[must_use]
    pub fn merge(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut merged = Self::new();
        for part in parts {
            merged.extend(part);
        }
        merged
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no path change was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in recording order
    pub fn iter(&self) -> impl Iterator<Item = &PathMapping> {
        self.entries.iter()
    }

    /// Old paths recorded more than once with different new paths
    ///
    /// Only the first mapping of each is ever used by [`resolve`](Self::resolve).
    /// Local mappings of different documents never compete, so they are
    /// compared per origin.
    #[must_use]
    pub fn duplicates(&self) -> Vec<&str> {
        let mut first: HashMap<(Option<&str>, &str), &str> = HashMap::new();
        let mut out = Vec::new();
        for m in &self.entries {
            let key = (m.origin().filter(|_| m.local), m.old.as_str());
            match first.get(&key) {
                Some(&new) if new != m.new && !out.contains(&m.old.as_str()) => {
                    out.push(m.old.as_str());
                }
                Some(_) => {}
                None => {
                    first.insert(key, m.new.as_str());
                }
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a MigrationContext {
    type Item = &'a PathMapping;
    type IntoIter = std::slice::Iter<'a, PathMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Visibility of recorded path changes across a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScope {
    /// One table shared by every document; references may cross files
    #[default]
    Batch,

    /// Each document only resolves against its own entries
    Document,
}

impl ContextScope {
    /// Parse a scope name as used on the command line
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "batch" => Some(Self::Batch),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Contexts the mutate phase resolves against, one view per document
#[derive(Debug, Clone)]
pub enum ScopedContexts {
    /// Every document sees the same merged table
    Shared(MigrationContext),

    /// Document `i` sees only the entries it recorded itself
    PerDocument(Vec<MigrationContext>),
}

impl ScopedContexts {
    /// Arrange collect output for the mutate phase
    ///
    /// `parts` holds the collect output of every document, in batch order.
    #[must_use]
    pub fn build(scope: ContextScope, parts: Vec<MigrationContext>) -> Self {
        match scope {
            ContextScope::Document => Self::PerDocument(parts),
            ContextScope::Batch => {
                let shared = MigrationContext::merge(parts);
                for old in shared.duplicates() {
                    tracing::warn!(
                        path = old,
                        "old path recorded more than once, first mapping wins"
                    );
                }
                Self::Shared(shared)
            }
        }
    }

    /// Context for the document at `index` in batch order
    #[must_use]
    pub fn for_document(&self, index: usize) -> Option<&MigrationContext> {
        match self {
            Self::Shared(ctx) => Some(ctx),
            Self::PerDocument(parts) => parts.get(index),
        }
    }

    /// Total number of recorded entries
    #[must_use]
    pub fn entry_count(&self) -> usize {
        match self {
            Self::Shared(ctx) => ctx.len(),
            Self::PerDocument(parts) => parts.iter().map(MigrationContext::len).sum(),
        }
    }
}
