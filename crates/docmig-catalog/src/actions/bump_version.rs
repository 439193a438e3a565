//! Version bump

use crate::rule::{read_version, Rule, RuleContext, RuleError, RuleOutcome, VERSION_ATTRIBUTE};
use docmig_tree::{Document, NodeId};

/// Raise the `version` attribute to a target value
#[derive(Debug, Clone, Copy)]
pub struct BumpVersion {
    to: i64,
}

impl BumpVersion {
    /// Create rule
    #[must_use]
    pub fn new(to: i64) -> Self {
        Self { to }
    }
}

impl Rule for BumpVersion {
    fn name(&self) -> &str {
        "bump_version"
    }

    fn describe(&self) -> String {
        format!("version -> {}", self.to)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        _ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        if read_version(doc, node)? >= self.to {
            return Ok(RuleOutcome::Unchanged);
        }
        doc.set_attribute(node, VERSION_ATTRIBUTE, self.to.to_string())?;
        Ok(RuleOutcome::Modified)
    }
}
