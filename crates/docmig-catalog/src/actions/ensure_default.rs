//! Ensure-default

use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{Document, NodeId};

/// Synthesize a child with a literal value when it is absent
#[derive(Debug, Clone)]
pub struct EnsureDefault {
    child: String,
    value: String,
}

impl EnsureDefault {
    /// Create rule
    #[must_use]
    pub fn new(child: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            value: value.into(),
        }
    }
}

impl Rule for EnsureDefault {
    fn name(&self) -> &str {
        "ensure_default"
    }

    fn describe(&self) -> String {
        format!("{} = {:?}", self.child, self.value)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        _ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        if doc.child_element_by_name(node, &self.child).is_some() {
            return Ok(RuleOutcome::Unchanged);
        }
        let child = doc.create_text_element(self.child.clone(), self.value.clone());
        doc.add_child(node, child)?;
        Ok(RuleOutcome::Modified)
    }
}
