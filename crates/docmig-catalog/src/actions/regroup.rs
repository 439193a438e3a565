//! Positional-to-keyed restructuring
//!
//! Turns parallel arrays addressed by position
//!
//! ```text
//! source/item[i]  mul/item[i]  add/item[i]
//! ```
//!
//! into one keyed group per position
//!
//! ```text
//! entries/item[i]/{source, mul, add}
//! ```
//!
//! replacing the array children wholesale.

use crate::rule::{Rule, RuleContext, RuleError, RuleOutcome};
use docmig_tree::{resolve_single, resolve_single_or_fail, Document, NodeId};

/// One parallel array and the field name its items get inside a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayField {
    source: String,
    field: String,
}

impl ArrayField {
    /// Create mapping from array element name to group field name
    #[must_use]
    pub fn new(source: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
        }
    }
}

/// Regroup parallel arrays into keyed entries
#[derive(Debug, Clone)]
pub struct Regroup {
    arrays: Vec<ArrayField>,
    group: String,
    item: String,
    array_item: String,
    arity: Option<usize>,
}

impl Regroup {
    /// Create rule
    ///
    /// With a declared `arity` every `array/item[i]` for `i < arity` must
    /// exist. Without one the longest array decides the group count and
    /// missing items are skipped.
    #[must_use]
    pub fn new(
        arrays: Vec<ArrayField>,
        group: impl Into<String>,
        item: impl Into<String>,
        array_item: impl Into<String>,
        arity: Option<usize>,
    ) -> Self {
        Self {
            arrays,
            group: group.into(),
            item: item.into(),
            array_item: array_item.into(),
            arity,
        }
    }

    fn item_expr(&self, array: &ArrayField, index: usize) -> String {
        format!("{}/{}[{index}]", array.source, self.array_item)
    }
}

impl Rule for Regroup {
    fn name(&self) -> &str {
        "regroup"
    }

    fn describe(&self) -> String {
        let arrays: Vec<_> = self
            .arrays
            .iter()
            .map(|a| format!("{}->{}", a.source, a.field))
            .collect();
        let arity = self
            .arity
            .map_or_else(|| "longest".to_string(), |k| k.to_string());
        format!("[{}] into {}/{} (k={arity})", arrays.join(", "), self.group, self.item)
    }

    fn apply(
        &self,
        doc: &mut Document,
        node: NodeId,
        ctx: &mut RuleContext<'_>,
    ) -> Result<RuleOutcome, RuleError> {
        let sources: Vec<NodeId> = self
            .arrays
            .iter()
            .filter_map(|a| doc.child_element_by_name(node, &a.source))
            .collect();
        // the group takes the place of whichever source comes first in the document
        let Some(first) = doc
            .children(node)
            .iter()
            .copied()
            .find(|c| sources.contains(c))
        else {
            return Ok(RuleOutcome::Unchanged);
        };

        let longest = sources
            .iter()
            .map(|&s| doc.child_elements_by_name(s, &self.array_item).len())
            .max()
            .unwrap_or(0);
        let k = self.arity.unwrap_or(longest);
        if longest > k {
            ctx.warn(format!(
                "{}: arrays hold {longest} items, only {k} regrouped",
                doc.compute_path(node)
            ));
        }

        // gather before moving anything so positional lookups see the old shape
        let mut rows = Vec::with_capacity(k);
        for i in 0..k {
            let mut row = Vec::with_capacity(self.arrays.len());
            for array in &self.arrays {
                let expr = self.item_expr(array, i);
                let item = if self.arity.is_some() {
                    Some(resolve_single_or_fail(doc, node, &expr)?)
                } else {
                    resolve_single(doc, node, &expr)
                };
                if let Some(item) = item {
                    row.push((array, item, doc.compute_path(item).to_string()));
                }
            }
            rows.push(row);
        }

        let group = doc.create_element(self.group.clone());
        doc.insert_before(node, Some(first), group)?;
        for row in rows {
            let entry = doc.create_element(self.item.clone());
            doc.add_child(group, entry)?;
            for (array, item, old) in row {
                doc.set_name(item, array.field.clone())?;
                doc.add_child(entry, item)?;
                ctx.record(old, doc.compute_path(item).to_string());
            }
        }
        for source in sources {
            doc.detach(source)?;
        }

        Ok(RuleOutcome::Modified)
    }
}
