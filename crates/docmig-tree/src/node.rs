//! Node handles and node payloads
//!
//! Nodes live in the [`Document`](crate::Document) arena and are addressed by
//! [`NodeId`]. A node is either an [`Element`] or a text run.

use indexmap::IndexMap;
use std::fmt::{self, Display, Formatter};

/// Handle to a node inside a [`Document`](crate::Document)
///
/// Handles stay valid for the lifetime of the document: detaching a node
/// never frees its slot, so a detached subtree can be reinserted elsewhere.
/// Cloning a document preserves every handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index of this node
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: a name plus ordered, unique attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) attributes: IndexMap<String, String>,
}

impl Element {
    /// Create element with no attributes
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value, if present
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attributes in stored order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Named node with attributes and children
    Element(Element),

    /// Character data
    Text(String),
}

impl NodeKind {
    /// Element payload, if this is an element
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }

    /// Text content, if this is a text node
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Element(_) => None,
        }
    }
}
