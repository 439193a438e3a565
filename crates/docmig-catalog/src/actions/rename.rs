//! Rename-on-condition

use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{Document, NodeId};

/// Rename a child element when the parent's type is allow-listed
#[derive(Debug, Clone)]
pub struct RenameChild {
    from: String,
    to: String,
    allowed_types: Vec<String>,
}

impl RenameChild {
    /// Create rule; an empty allow-list accepts any type
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, allowed_types: Vec<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            allowed_types,
        }
    }

    fn allows(&self, type_tag: Option<&str>) -> bool {
        self.allowed_types.is_empty()
            || type_tag.is_some_and(|t| self.allowed_types.iter().any(|a| a == t))
    }
}

impl Rule for RenameChild {
    fn name(&self) -> &str {
        "rename_child"
    }

    fn describe(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        if !self.allows(doc.type_tag(node)) {
            return Ok(RuleOutcome::Unchanged);
        }
        let Some(child) = doc.child_element_by_name(node, &self.from) else {
            return Ok(RuleOutcome::Unchanged);
        };

        let old = doc.compute_path(child).to_string();
        doc.set_name(child, self.to.clone())?;
        ctx.record(old, doc.compute_path(child).to_string());

        Ok(RuleOutcome::Modified)
    }
}
