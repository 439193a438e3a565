//! Declarative rule sets
//!
//! Rule sets are TOML documents with one `[[rule]]` table per rule:
//!
//! ```toml
//! [[rule]]
//! types = ["traktor.world.GroupEntityData"]
//! version = 2
//!
//! [rule.action]
//! kind = "rename_child"
//! from = "instance"
//! to = "entityData"
//! ```

use crate::actions::{
    ArrayField, BumpVersion, CollapseIndirection, ElementTemplate, EnsureDefault, InsertAfter,
    ReencodeOrientation, Regroup, RenameChild,
};
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Errors from loading a rule set
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Not valid TOML or wrong shape
    #[error("invalid rule set: {0}")]
    Toml(#[from] toml::de::Error),

    /// Rule names no type tag
    #[error("rule {index} ({action}) has no types")]
    NoTypes { index: usize, action: String },

    /// Action needs a target version
    #[error("rule {index} ({action}) requires a version")]
    MissingVersion { index: usize, action: String },

    /// Parameter out of range
    #[error("rule {index} ({action}): {message}")]
    InvalidParameter {
        index: usize,
        action: String,
        message: String,
    },
}

/// A whole rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetSpec {
    /// Rules in application order
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

impl RuleSetSpec {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `SpecError::Toml` on syntax or shape errors
    pub fn from_toml(text: &str) -> Result<Self, SpecError> {
        Ok(toml::from_str(text)?)
    }
}

/// One rule: where it applies and what it does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Type tags the rule is registered under
    pub types: Vec<String>,

    /// Target version; the rule only runs while `version < target`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Action and its parameters
    pub action: ActionSpec,
}

/// Action parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Replace a wrapper by its payload child
    Collapse {
        /// Payload child name
        payload: String,
        /// Name child relocated into the payload
        #[serde(default = "default_name_child")]
        name_child: String,
    },

    /// Rename a child of allow-listed types (the rule's `types`)
    RenameChild {
        /// Current child name
        from: String,
        /// New child name
        to: String,
    },

    /// Add a child with a literal value when absent
    EnsureDefault {
        /// Child name
        child: String,
        /// Text of the synthesized child
        value: String,
    },

    /// Regroup parallel arrays into keyed entries
    Regroup {
        /// Arrays to regroup, in field order
        arrays: Vec<ArraySpec>,
        /// Name of the synthesized group element
        #[serde(default = "default_group")]
        group: String,
        /// Name of each entry inside the group
        #[serde(default = "default_item")]
        item: String,
        /// Name of the items inside each array
        #[serde(default = "default_item")]
        array_item: String,
        /// Fixed group count; absent means longest array
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arity: Option<usize>,
    },

    /// Insert an element right after an anchor child
    InsertAfter {
        /// Anchor child name
        anchor: String,
        /// Element to insert
        element: TemplateSpec,
    },

    /// Raise `version` to the rule's version
    BumpVersion,

    /// Re-encode quaternion keys as heading/pitch
    ReencodeOrientation {
        /// Path from the tagged element to the keys container
        keys: String,
        /// Name of each key
        #[serde(default = "default_item")]
        item: String,
        /// Path from a key to its literal
        field: String,
    },
}

impl ActionSpec {
    /// Action name as written in rule sets
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Collapse { .. } => "collapse",
            Self::RenameChild { .. } => "rename_child",
            Self::EnsureDefault { .. } => "ensure_default",
            Self::Regroup { .. } => "regroup",
            Self::InsertAfter { .. } => "insert_after",
            Self::BumpVersion => "bump_version",
            Self::ReencodeOrientation { .. } => "reencode_orientation",
        }
    }
}

/// One array of a regroup action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySpec {
    /// Array element name
    pub source: String,
    /// Field name inside each entry; defaults to `source`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Element template of an insert action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// Element name
    pub name: String,
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

fn default_name_child() -> String {
    "name".to_string()
}

fn default_group() -> String {
    "entries".to_string()
}

fn default_item() -> String {
    "item".to_string()
}

impl RuleSpec {
    /// Build the rule object
    ///
    /// `index` is the rule's position in its set, used in error messages.
    ///
    /// # Errors
    /// Returns `SpecError` when the rule is incomplete or out of range
    pub fn build(&self, index: usize) -> Result<Arc<dyn Rule>, SpecError> {
        let action = self.action.kind().to_string();
        if self.types.is_empty() {
            return Err(SpecError::NoTypes { index, action });
        }
        let invalid = |message: &str| SpecError::InvalidParameter {
            index,
            action: action.clone(),
            message: message.to_string(),
        };

        let rule: Arc<dyn Rule> = match &self.action {
            ActionSpec::Collapse {
                payload,
                name_child,
            } => Arc::new(CollapseIndirection::new(name_child.clone(), payload.clone())),
            ActionSpec::RenameChild { from, to } => {
                Arc::new(RenameChild::new(from.clone(), to.clone(), self.types.clone()))
            }
            ActionSpec::EnsureDefault { child, value } => {
                Arc::new(EnsureDefault::new(child.clone(), value.clone()))
            }
            ActionSpec::Regroup {
                arrays,
                group,
                item,
                array_item,
                arity,
            } => {
                if arrays.is_empty() {
                    return Err(invalid("no arrays to regroup"));
                }
                if *arity == Some(0) {
                    return Err(invalid("arity must be at least 1"));
                }
                let arrays = arrays
                    .iter()
                    .map(|a| {
                        ArrayField::new(
                            a.source.clone(),
                            a.field.clone().unwrap_or_else(|| a.source.clone()),
                        )
                    })
                    .collect();
                Arc::new(Regroup::new(
                    arrays,
                    group.clone(),
                    item.clone(),
                    array_item.clone(),
                    *arity,
                ))
            }
            ActionSpec::InsertAfter { anchor, element } => Arc::new(InsertAfter::new(
                anchor.clone(),
                ElementTemplate {
                    name: element.name.clone(),
                    text: element.text.clone(),
                    attributes: element.attributes.clone(),
                },
            )),
            ActionSpec::BumpVersion => {
                let to = self
                    .version
                    .ok_or_else(|| SpecError::MissingVersion {
                        index,
                        action: action.clone(),
                    })?;
                Arc::new(BumpVersion::new(to))
            }
            ActionSpec::ReencodeOrientation { keys, item, field } => {
                if self.version.is_none() {
                    return Err(SpecError::MissingVersion {
                        index,
                        action: action.clone(),
                    });
                }
                Arc::new(ReencodeOrientation::new(
                    keys.clone(),
                    item.clone(),
                    field.clone(),
                ))
            }
        };
        Ok(rule)
    }
}
