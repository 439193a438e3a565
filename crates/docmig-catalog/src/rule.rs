//! Rule trait and the state a rule sees while it runs

use docmig_context::MigrationContext;
use docmig_tree::{Document, NodeId, ResolveError, TreeError};
use std::fmt::Debug;

/// Name of the attribute holding an element's schema version
pub const VERSION_ATTRIBUTE: &str = "version";

/// Name of the attribute holding a structural reference
pub const REF_ATTRIBUTE: &str = "ref";

/// Errors raised by rule application
///
/// Every variant is fatal for the document being migrated. Recoverable
/// conditions (degenerate rotations, unresolved references) never surface
/// here; they are reported through [`RuleContext::warn`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Structural insertion needs a sibling that is not there
    #[error("anchor '{anchor}' not found under {node}")]
    MissingAnchor { anchor: String, node: String },

    /// Required structure is absent
    #[error("required structure missing: {0}")]
    MissingStructure(#[from] ResolveError),

    /// A literal field could not be parsed
    #[error("invalid literal at {node}: '{value}' ({reason})")]
    InvalidLiteral {
        node: String,
        value: String,
        reason: String,
    },

    /// `version` attribute is not an integer
    #[error("invalid version '{value}' at {node}")]
    InvalidVersion { node: String, value: String },

    /// Tree mutation failed
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

impl RuleError {
    /// Create missing anchor error for `node`
    pub fn missing_anchor(doc: &Document, node: NodeId, anchor: impl Into<String>) -> Self {
        Self::MissingAnchor {
            anchor: anchor.into(),
            node: doc.compute_path(node).to_string(),
        }
    }

    /// Create invalid literal error for `node`
    pub fn invalid_literal(
        doc: &Document,
        node: NodeId,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidLiteral {
            node: doc.compute_path(node).to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// What a rule did to the node it was applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Guard did not match; nothing changed
    Unchanged,

    /// Node (or its subtree) was rewritten in place
    Modified,

    /// Node was replaced by another element, now at its position
    Replaced(NodeId),

    /// Node was removed from the tree
    Removed,
}

/// Per-document state handed to each rule
///
/// `shared` is the frozen reference table of the batch. Path changes a rule
/// actually produces are recorded into `local`, which the pipeline checks
/// against the collect-phase projection once the document is done.
#[derive(Debug)]
pub struct RuleContext<'a> {
    document_id: &'a str,
    shared: &'a MigrationContext,
    local: MigrationContext,
    warnings: Vec<String>,
    quiet: bool,
}

impl<'a> RuleContext<'a> {
    /// Create context for one document
    #[must_use]
    pub fn new(document_id: &'a str, shared: &'a MigrationContext) -> Self {
        Self {
            document_id,
            shared,
            local: MigrationContext::new(),
            warnings: Vec::new(),
            quiet: false,
        }
    }

    /// Create context for a scratch run whose warnings are collected but
    /// not logged
    #[must_use]
    pub fn quiet(document_id: &'a str, shared: &'a MigrationContext) -> Self {
        Self {
            quiet: true,
            ..Self::new(document_id, shared)
        }
    }

    /// Identifier of the document being migrated
    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &str {
        self.document_id
    }

    /// Look up a path in the batch reference table, as seen from this
    /// document
    #[inline]
    #[must_use]
    pub fn resolve(&self, old: &str) -> Option<&'a str> {
        self.shared.resolve_for(self.document_id, old)
    }

    /// Record a path change produced by this document
    pub fn record(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.local.record_from(self.document_id, old, new);
    }

    /// Report a recoverable condition
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.quiet {
            tracing::warn!(document = self.document_id, "{message}");
        }
        self.warnings.push(message);
    }

    /// Path changes recorded so far
    #[inline]
    #[must_use]
    pub fn recorded(&self) -> &MigrationContext {
        &self.local
    }

    /// Warnings reported so far
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consume into recorded path changes and warnings
    #[must_use]
    pub fn into_parts(self) -> (MigrationContext, Vec<String>) {
        (self.local, self.warnings)
    }
}

/// A rewrite rule for one element type
///
/// Rules receive the element whose type tag they are registered for. The
/// only allowed side effects are mutations of the document and calls on the
/// [`RuleContext`]. A rule must leave a document it has already migrated
/// unchanged when applied again, either because its structural guard no
/// longer matches or because it is registered with a target version.
pub trait Rule: Send + Sync + Debug {
    /// Short action name used in logs and listings
    fn name(&self) -> &str;

    /// One-line summary of the parameters, for listings
    fn describe(&self) -> String;

    /// Path changes this rule will cause that cannot be seen by following
    /// surviving nodes
    ///
    /// Each pair maps a node that disappears to the node taking its place.
    /// Called on the unmodified document during the collect phase.
    fn tracked_nodes(&self, _doc: &Document, _node: NodeId) -> Vec<(NodeId, NodeId)> {
        Vec::new()
    }

    /// Apply the rule to `node`
    ///
    /// # Errors
    /// Returns `RuleError` when the document cannot be migrated; the
    /// document is then left uncommitted by the caller.
    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError>;
}

/// Read the `version` attribute of `node`; a missing attribute means 0
///
/// # Errors
/// Returns `RuleError::InvalidVersion` if the attribute is not an integer
pub fn read_version(doc: &Document, node: NodeId) -> Result<i64, RuleError> {
    let raw = doc.attribute_or(node, VERSION_ATTRIBUTE, "0");
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RuleError::InvalidVersion {
            node: doc.compute_path(node).to_string(),
            value: raw.to_string(),
        })
}
