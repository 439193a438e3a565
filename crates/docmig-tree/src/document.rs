//! Arena-backed document tree
//!
//! Provides [`Document`], the mutable tree a migration run operates on.
//!
//! # Ownership
//!
//! Every node lives in one arena owned by the document; parent links are
//! plain [`NodeId`] back-references used for path computation and
//! detachment, never for lifetime. Detaching a node keeps its subtree intact
//! so it can be reinserted (for example, hoisting a grandchild up to replace
//! its parent).

use crate::node::{Element, NodeId, NodeKind};
use crate::path::{PathSegment, StructuralPath};

/// Errors raised by structural mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Handle does not belong to this document
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Operation requires an element
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Reference node is not a child of the given parent
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Insertion would make a node its own ancestor
    #[error("inserting {node} under {parent} would create a cycle")]
    Cycle { parent: NodeId, node: NodeId },

    /// Positional insertion past the end of the child list
    #[error("child index {index} out of bounds for {parent} ({len} children)")]
    IndexOutOfBounds {
        parent: NodeId,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Hierarchical markup document
///
/// # Invariants
/// - `root` is an element and has no parent
/// - a node appears in at most one `children` list, and that list belongs to
///   its `parent`
/// - text nodes never have children
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    root: NodeId,
}

impl Document {
    /// Create document holding a single empty root element
    #[must_use]
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            slots: vec![Slot {
                kind: NodeKind::Element(Element::new(root_name)),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// Root element
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of allocated nodes, attached or not
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, TreeError> {
        self.slots.get(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, TreeError> {
        self.slots.get_mut(id.0).ok_or(TreeError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
        match &mut self.slot_mut(id)?.kind {
            NodeKind::Element(e) => Ok(e),
            NodeKind::Text(_) => Err(TreeError::NotAnElement(id)),
        }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create detached element
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Create detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(content.into()))
    }

    /// Create detached element holding a single text child
    pub fn create_text_element(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> NodeId {
        let element = self.create_element(name);
        let text = text.into();
        if !text.is_empty() {
            let t = self.create_text(text);
            self.slots[t.0].parent = Some(element);
            self.slots[element.0].children.push(t);
        }
        element
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Node payload
    #[inline]
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.slots.get(id.0).map(|s| &s.kind)
    }

    /// Element payload, if `id` is an element
    #[inline]
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.kind(id).and_then(NodeKind::as_element)
    }

    /// Check if `id` is an element
    #[inline]
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Element name
    #[inline]
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    /// Content of a text node
    #[inline]
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(NodeKind::as_text)
    }

    /// Parent back-reference
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.0).and_then(|s| s.parent)
    }

    /// Ordered children (elements and text interleaved)
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots.get(id.0).map_or(&[], |s| s.children.as_slice())
    }

    /// First child of any kind
    #[inline]
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Following sibling of any kind
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Preceding sibling of any kind
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Snapshot of the element children, in order
    #[must_use]
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// First element child with the given name; text children are skipped
    #[must_use]
    pub fn child_element_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// All element children with the given name, in order
    #[must_use]
    pub fn child_elements_by_name(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.name(c) == Some(name))
            .collect()
    }

    /// Elements of the subtree rooted at `id`, in pre-order (including `id`)
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.is_element(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Check if `ancestor` is `node` or one of its ancestors
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Check if `id` is reachable from the root
    #[inline]
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_or_self(self.root, id)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Attribute value, if present
    #[inline]
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute(name))
    }

    /// Attribute value, or `default` when the attribute (or element) is absent
    ///
    /// Never fails, so callers can default-parse optional fields such as a
    /// missing `version`.
    #[inline]
    #[must_use]
    pub fn attribute_or<'a>(&'a self, id: NodeId, name: &str, default: &'a str) -> &'a str {
        self.attribute(id, name).unwrap_or(default)
    }

    /// Value of the `type` attribute
    #[inline]
    #[must_use]
    pub fn type_tag(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "type")
    }

    /// Set attribute, keeping its position if it already exists
    ///
    /// # Errors
    /// Returns error if `id` is not an element of this document
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, TreeError> {
        Ok(self
            .element_mut(id)?
            .attributes
            .insert(name.into(), value.into()))
    }

    /// Remove attribute, preserving the order of the remaining ones
    ///
    /// # Errors
    /// Returns error if `id` is not an element of this document
    pub fn remove_attribute(
        &mut self,
        id: NodeId,
        name: &str,
    ) -> Result<Option<String>, TreeError> {
        Ok(self.element_mut(id)?.attributes.shift_remove(name))
    }

    /// Rename element
    ///
    /// # Errors
    /// Returns error if `id` is not an element of this document
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), TreeError> {
        self.element_mut(id)?.name = name.into();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Concatenated content of the direct text children
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|&c| self.text(c))
            .collect()
    }

    /// Replace all children of `id` with a single text node
    ///
    /// An empty `text` leaves the element without children.
    ///
    /// # Errors
    /// Returns error if `id` is not an element of this document
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        self.remove_all_children(id)?;
        let text = text.into();
        if !text.is_empty() {
            let t = self.create_text(text);
            self.add_child(id, t)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Detach node from its parent, keeping its own subtree
    ///
    /// Detaching an already detached node is a no-op.
    ///
    /// # Errors
    /// Returns error if `id` does not belong to this document
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.slot(id)?.parent else {
            return Ok(());
        };
        self.slots[parent.0].children.retain(|&c| c != id);
        self.slots[id.0].parent = None;
        Ok(())
    }

    /// Detach `child`, which must currently be a child of `parent`
    ///
    /// # Errors
    /// Returns `TreeError::NotAChild` if `child` is not under `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.slot(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.detach(child)
    }

    /// Detach every child of `parent`, returning them in order
    ///
    /// # Errors
    /// Returns error if `parent` does not belong to this document
    pub fn remove_all_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let children = std::mem::take(&mut self.slot_mut(parent)?.children);
        for &c in &children {
            self.slots[c.0].parent = None;
        }
        Ok(children)
    }

    fn check_insert(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.slot(node)?;
        if self.slot(parent)?.kind.as_element().is_none() {
            return Err(TreeError::NotAnElement(parent));
        }
        if self.is_ancestor_or_self(node, parent) {
            return Err(TreeError::Cycle { parent, node });
        }
        Ok(())
    }

    /// Insert `node` at position `index` of `parent`'s children
    ///
    /// `node` is detached from its current parent first; `index` is
    /// interpreted against the child list after that detachment.
    ///
    /// # Errors
    /// - `TreeError::NotAnElement` if `parent` is a text node
    /// - `TreeError::Cycle` if `node` is `parent` or one of its ancestors
    /// - `TreeError::IndexOutOfBounds` if `index` exceeds the child count
    pub fn insert_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        node: NodeId,
    ) -> Result<(), TreeError> {
        self.check_insert(parent, node)?;
        self.detach(node)?;
        let len = self.slots[parent.0].children.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { parent, index, len });
        }
        self.slots[parent.0].children.insert(index, node);
        self.slots[node.0].parent = Some(parent);
        Ok(())
    }

    /// Append `node` as last child of `parent`
    ///
    /// # Errors
    /// See [`Document::insert_child_at`]
    pub fn add_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, node)?;
        self.detach(node)?;
        self.slots[parent.0].children.push(node);
        self.slots[node.0].parent = Some(parent);
        Ok(())
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.children(parent)
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }

    /// Insert `node` immediately before `reference`; `None` prepends
    ///
    /// # Errors
    /// Returns `TreeError::NotAChild` if `reference` is not under `parent`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        node: NodeId,
    ) -> Result<(), TreeError> {
        if reference == Some(node) {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.detach(node)?;
        let index = match reference {
            Some(r) => self.position_of(parent, r)?,
            None => 0,
        };
        self.insert_child_at(parent, index, node)
    }

    /// Insert `node` immediately after `reference`; `None` prepends
    ///
    /// # Errors
    /// Returns `TreeError::NotAChild` if `reference` is not under `parent`
    pub fn insert_after(
        &mut self,
        parent: NodeId,
        reference: Option<NodeId>,
        node: NodeId,
    ) -> Result<(), TreeError> {
        if reference == Some(node) {
            return Ok(());
        }
        self.check_insert(parent, node)?;
        self.detach(node)?;
        let index = match reference {
            Some(r) => self.position_of(parent, r)? + 1,
            None => 0,
        };
        self.insert_child_at(parent, index, node)
    }

    /// Put `new` in the position currently held by `old`, detaching `old`
    ///
    /// `new` may live inside `old`'s subtree (hoisting a descendant). When
    /// `old` is the root, `new` becomes the root.
    ///
    /// # Errors
    /// - `TreeError::Cycle` if `new` is an ancestor of `old`
    /// - `TreeError::NotAnElement` if `new` is a text node replacing the root
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        self.slot(old)?;
        self.slot(new)?;
        if old == new {
            return Ok(());
        }
        if self.is_ancestor_or_self(new, old) {
            return Err(TreeError::Cycle { parent: old, node: new });
        }
        self.detach(new)?;
        match self.parent(old) {
            Some(parent) => {
                let index = self.position_of(parent, old)?;
                self.slots[parent.0].children[index] = new;
                self.slots[new.0].parent = Some(parent);
                self.slots[old.0].parent = None;
            }
            None if old == self.root => {
                if !self.is_element(new) {
                    return Err(TreeError::NotAnElement(new));
                }
                self.root = new;
            }
            None => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------

    /// Structural path of `id`, recomputed from the live tree
    ///
    /// Each segment counts same-named element siblings that precede the
    /// node. For a text node the path of its parent element is returned. A
    /// node in a detached subtree gets a path anchored at the top of that
    /// subtree.
    #[must_use]
    pub fn compute_path(&self, id: NodeId) -> StructuralPath {
        let mut segments = Vec::new();
        let mut current = if self.is_element(id) {
            Some(id)
        } else {
            self.parent(id)
        };

        while let Some(node) = current {
            let Some(name) = self.name(node) else { break };
            let index = match self.parent(node) {
                Some(parent) => self
                    .children(parent)
                    .iter()
                    .take_while(|&&c| c != node)
                    .filter(|&&c| self.name(c) == Some(name))
                    .count(),
                None => 0,
            };
            segments.push(PathSegment::new(name, index));
            current = self.parent(node);
        }

        segments.reverse();
        StructuralPath::absolute(segments)
    }

    /// Compare the attached trees of two documents
    ///
    /// Element names, attribute sets and order, child order and text must
    /// match; node handles are not compared.
    #[must_use]
    pub fn same_structure(&self, other: &Document) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }

    fn subtree_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        match (self.kind(a), other.kind(b)) {
            (Some(NodeKind::Text(x)), Some(NodeKind::Text(y))) => x == y,
            (Some(NodeKind::Element(x)), Some(NodeKind::Element(y))) => {
                x.name == y.name
                    && x.attributes.iter().eq(y.attributes.iter())
                    && self.children(a).len() == other.children(b).len()
                    && self
                        .children(a)
                        .iter()
                        .zip(other.children(b))
                        .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("object");
        let root = doc.root();
        let a = doc.create_element("item");
        let b = doc.create_element("item");
        let c = doc.create_element("name");
        doc.add_child(root, a).unwrap();
        doc.add_child(root, c).unwrap();
        doc.add_child(root, b).unwrap();
        (doc, a, b, c)
    }

    #[test]
    fn add_child_sets_parent_and_order() {
        let (doc, a, b, c) = sample();
        assert_eq!(doc.children(doc.root()), &[a, c, b]);
        assert_eq!(doc.parent(b), Some(doc.root()));
        assert_eq!(doc.first_child(doc.root()), Some(a));
        assert_eq!(doc.next_sibling(a), Some(c));
        assert_eq!(doc.next_sibling(b), None);
        assert_eq!(doc.previous_sibling(c), Some(a));
    }

    #[test]
    fn compute_path_counts_same_named_siblings() {
        let (doc, a, b, c) = sample();
        assert_eq!(doc.compute_path(a).to_string(), "/object/item");
        assert_eq!(doc.compute_path(b).to_string(), "/object/item[1]");
        assert_eq!(doc.compute_path(c).to_string(), "/object/name");
        assert_eq!(doc.compute_path(doc.root()).to_string(), "/object");
    }

    #[test]
    fn compute_path_is_recomputed_after_mutation() {
        let (mut doc, a, b, _) = sample();
        let before = doc.compute_path(b).to_string();
        doc.detach(a).unwrap();
        let after = doc.compute_path(b).to_string();
        assert_eq!(before, "/object/item[1]");
        assert_eq!(after, "/object/item");
    }

    #[test]
    fn remove_child_keeps_detached_subtree() {
        let (mut doc, a, _, _) = sample();
        let inner = doc.create_text_element("value", "42");
        doc.add_child(a, inner).unwrap();

        doc.remove_child(doc.root(), a).unwrap();
        assert_eq!(doc.parent(a), None);
        assert!(!doc.is_attached(inner));
        assert_eq!(doc.children(a), &[inner]);
        assert_eq!(doc.text_content(inner), "42");
    }

    #[test]
    fn remove_child_rejects_foreign_child() {
        let (mut doc, a, b, _) = sample();
        let err = doc.remove_child(a, b).unwrap_err();
        assert_eq!(err, TreeError::NotAChild { parent: a, child: b });
    }

    #[test]
    fn insert_before_and_after() {
        let (mut doc, a, b, c) = sample();
        let x = doc.create_element("x");
        let y = doc.create_element("y");
        doc.insert_before(doc.root(), Some(c), x).unwrap();
        doc.insert_after(doc.root(), Some(c), y).unwrap();
        assert_eq!(doc.children(doc.root()), &[a, x, c, y, b]);
    }

    #[test]
    fn insert_with_no_reference_prepends() {
        let (mut doc, a, b, c) = sample();
        let x = doc.create_element("x");
        let y = doc.create_element("y");
        doc.insert_after(doc.root(), None, x).unwrap();
        doc.insert_before(doc.root(), None, y).unwrap();
        assert_eq!(doc.children(doc.root()), &[y, x, a, c, b]);
    }

    #[test]
    fn insert_moves_existing_child() {
        let (mut doc, a, b, c) = sample();
        doc.insert_before(doc.root(), Some(a), b).unwrap();
        assert_eq!(doc.children(doc.root()), &[b, a, c]);
    }

    #[test]
    fn insert_rejects_cycle() {
        let (mut doc, a, _, _) = sample();
        let inner = doc.create_element("inner");
        doc.add_child(a, inner).unwrap();
        let err = doc.add_child(inner, a).unwrap_err();
        assert_eq!(err, TreeError::Cycle { parent: inner, node: a });
    }

    #[test]
    fn insert_into_text_is_rejected() {
        let mut doc = Document::new("r");
        let t = doc.create_text("x");
        let e = doc.create_element("e");
        assert_eq!(doc.add_child(t, e).unwrap_err(), TreeError::NotAnElement(t));
    }

    #[test]
    fn replace_hoists_grandchild() {
        let (mut doc, a, _, _) = sample();
        let wrapper_child = doc.create_element("payload");
        let grandchild = doc.create_element("deep");
        doc.add_child(a, wrapper_child).unwrap();
        doc.add_child(wrapper_child, grandchild).unwrap();

        doc.replace(a, grandchild).unwrap();
        assert_eq!(doc.children(doc.root())[0], grandchild);
        assert_eq!(doc.parent(grandchild), Some(doc.root()));
        assert_eq!(doc.parent(a), None);
        assert!(!doc.is_attached(wrapper_child));
    }

    #[test]
    fn replace_root() {
        let (mut doc, a, _, _) = sample();
        doc.replace(doc.root(), a).unwrap();
        assert_eq!(doc.root(), a);
        assert_eq!(doc.parent(a), None);
        assert_eq!(doc.compute_path(a).to_string(), "/item");
    }

    #[test]
    fn attribute_or_returns_default() {
        let (mut doc, a, _, _) = sample();
        assert_eq!(doc.attribute_or(a, "version", "0"), "0");
        doc.set_attribute(a, "version", "3").unwrap();
        assert_eq!(doc.attribute_or(a, "version", "0"), "3");
    }

    #[test]
    fn set_attribute_keeps_position() {
        let (mut doc, a, _, _) = sample();
        doc.set_attribute(a, "type", "t").unwrap();
        doc.set_attribute(a, "version", "1").unwrap();
        doc.set_attribute(a, "type", "u").unwrap();
        let attrs: Vec<_> = doc.element(a).unwrap().attributes().collect();
        assert_eq!(attrs, vec![("type", "u"), ("version", "1")]);

        assert_eq!(doc.remove_attribute(a, "type").unwrap(), Some("u".into()));
        assert_eq!(doc.type_tag(a), None);
    }

    #[test]
    fn child_element_by_name_skips_text() {
        let mut doc = Document::new("r");
        let root = doc.root();
        let t = doc.create_text("name");
        let n = doc.create_element("name");
        doc.add_child(root, t).unwrap();
        doc.add_child(root, n).unwrap();
        assert_eq!(doc.child_element_by_name(root, "name"), Some(n));
        assert_eq!(doc.child_elements(root), vec![n]);
    }

    #[test]
    fn set_text_replaces_children() {
        let mut doc = Document::new("r");
        let root = doc.root();
        let e = doc.create_element("e");
        doc.add_child(root, e).unwrap();
        doc.set_text(root, "hello").unwrap();
        assert_eq!(doc.text_content(root), "hello");
        assert_eq!(doc.child_elements(root), Vec::<NodeId>::new());

        doc.set_text(root, "").unwrap();
        assert!(doc.children(root).is_empty());
    }

    #[test]
    fn descendants_are_preorder() {
        let (mut doc, a, b, c) = sample();
        let inner = doc.create_element("inner");
        doc.add_child(a, inner).unwrap();
        assert_eq!(doc.descendants(doc.root()), vec![doc.root(), a, inner, c, b]);
    }

    #[test]
    fn clone_preserves_handles() {
        let (mut doc, a, b, _) = sample();
        let mut copy = doc.clone();
        copy.detach(a).unwrap();
        assert_eq!(copy.compute_path(b).to_string(), "/object/item");
        assert_eq!(doc.compute_path(b).to_string(), "/object/item[1]");
        doc.set_name(b, "other").unwrap();
        assert_eq!(copy.name(b), Some("item"));
    }

    #[test]
    fn same_structure_ignores_handles() {
        let (doc, _, _, _) = sample();
        let mut other = Document::new("object");
        let root = other.root();
        for name in ["item", "name", "item"] {
            let e = other.create_element(name);
            other.add_child(root, e).unwrap();
        }
        assert!(doc.same_structure(&other));
        let extra = other.create_element("x");
        other.add_child(root, extra).unwrap();
        assert!(!doc.same_structure(&other));
    }
}
