//! Indirection collapse

use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{Document, NodeId};

/// Replace a wrapper element by its payload child
///
/// The wrapper's `name` child moves to the front of the payload. If the
/// payload already carries its own `name` the wrapper's one is dropped with
/// a warning. The wrapper's old path is recorded against the payload's new
/// path so references to the wrapper follow it.
#[derive(Debug, Clone)]
pub struct CollapseIndirection {
    name_child: String,
    payload: String,
}

impl CollapseIndirection {
    /// Create rule
    #[must_use]
    pub fn new(name_child: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name_child: name_child.into(),
            payload: payload.into(),
        }
    }
}

impl Rule for CollapseIndirection {
    fn name(&self) -> &str {
        "collapse"
    }

    fn describe(&self) -> String {
        format!("payload={} name_child={}", self.payload, self.name_child)
    }

    fn tracked_nodes(&self, doc: &Document, node: NodeId) -> Vec<(NodeId, NodeId)> {
        doc.child_element_by_name(node, &self.payload)
            .map(|payload| vec![(node, payload)])
            .unwrap_or_default()
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let Some(payload) = doc.child_element_by_name(node, &self.payload) else {
            return Ok(RuleOutcome::Unchanged);
        };

        let old = doc.compute_path(node).to_string();
        let name = doc.child_element_by_name(node, &self.name_child);

        doc.replace(node, payload)?;

        if let Some(name) = name {
            if doc.child_element_by_name(payload, &self.name_child).is_some() {
                ctx.warn(format!(
                    "{old}: payload already has <{}>, wrapper's one dropped",
                    self.name_child
                ));
            } else {
                doc.insert_child_at(payload, 0, name)?;
            }
        }

        let new = doc.compute_path(payload).to_string();
        tracing::debug!(document = ctx.document_id(), %old, %new, "collapsed indirection");
        ctx.record(old, new);

        Ok(RuleOutcome::Replaced(payload))
    }
}
