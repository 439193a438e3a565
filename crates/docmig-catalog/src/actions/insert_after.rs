//! Structural insertion after an anchor child

use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{Document, NodeId};
use std::collections::BTreeMap;

/// Element to synthesize: a name, optional text and attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementTemplate {
    /// Element name
    pub name: String,
    /// Text content, if any
    pub text: Option<String>,
    /// Attributes, written in key order
    pub attributes: BTreeMap<String, String>,
}

impl ElementTemplate {
    /// Create the element in `doc`, detached
    ///
    /// # Errors
    /// Returns `RuleError::Tree` if attributes cannot be set
    pub fn instantiate(&self, doc: &mut Document) -> Result<NodeId, RuleError> {
        let node = match &self.text {
            Some(text) => doc.create_text_element(self.name.clone(), text.clone()),
            None => doc.create_element(self.name.clone()),
        };
        for (key, value) in &self.attributes {
            doc.set_attribute(node, key.clone(), value.clone())?;
        }
        Ok(node)
    }
}

/// Insert a new child immediately after a named anchor child
///
/// Does nothing when a child with the template's name already exists. A
/// missing anchor is fatal for the document.
#[derive(Debug, Clone)]
pub struct InsertAfter {
    anchor: String,
    element: ElementTemplate,
}

impl InsertAfter {
    /// Create rule
    #[must_use]
    pub fn new(anchor: impl Into<String>, element: ElementTemplate) -> Self {
        Self {
            anchor: anchor.into(),
            element,
        }
    }
}

impl Rule for InsertAfter {
    fn name(&self) -> &str {
        "insert_after"
    }

    fn describe(&self) -> String {
        format!("<{}> after <{}>", self.element.name, self.anchor)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        _ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        if doc.child_element_by_name(node, &self.element.name).is_some() {
            return Ok(RuleOutcome::Unchanged);
        }
        let anchor = doc
            .child_element_by_name(node, &self.anchor)
            .ok_or_else(|| RuleError::missing_anchor(doc, node, self.anchor.clone()))?;

        let inserted = self.element.instantiate(doc)?;
        doc.insert_after(node, Some(anchor), inserted)?;
        Ok(RuleOutcome::Modified)
    }
}
