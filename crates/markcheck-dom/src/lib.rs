//! Document tree for markcheck.
//!
//! This crate provides the node model the parser builds and the validator and
//! rules read: an arena-based tree of document, element and text nodes, the
//! shape of per-tag metadata records, and a selector engine for querying the
//! tree.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships.
//! Parents own their children through index lists; the parent link on each
//! node is a plain index used for upward traversal. A `NodeId` is also the
//! node's creation-order identity: ids are handed out sequentially per tree.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ops::Index;
use std::rc::Rc;

use markcheck_common::Location;
use serde::Serialize;

pub mod element;
pub mod meta;
pub mod selector;

pub use element::{Attribute, DomTokenList, DynamicValue, ElementData, NodeClosed, Value};
pub use meta::MetaElement;
pub use selector::{Selector, SelectorError};

/// A type-safe index into the document tree.
///
/// Ids are allocated in creation order, so comparing two ids tells which node
/// was created first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// The kind of a node. Only elements carry the rich fields.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// The document root.
    Document,
    /// An element.
    Element(ElementData),
    /// A run of text (possibly dynamic).
    Text(Value),
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What kind of node this is.
    pub node_type: NodeType,
    /// Where the node starts in the source.
    pub location: Location,
    /// The parent node; `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,
    /// Child nodes in document order.
    pub children: Vec<NodeId>,
    /// Rules disabled for this node by directives.
    disabled_rules: RefCell<HashSet<String>>,
}

impl Node {
    fn new(node_type: NodeType, location: Location) -> Self {
        Self {
            node_type,
            location,
            parent: None,
            children: Vec::new(),
            disabled_rules: RefCell::new(HashSet::new()),
        }
    }

    /// `#document`, `#text`, or the element's tag name.
    #[must_use]
    pub fn node_name(&self) -> &str {
        match &self.node_type {
            NodeType::Document => "#document",
            NodeType::Element(data) => &data.tag_name,
            NodeType::Text(_) => "#text",
        }
    }

    /// Element data, if this node is an element.
    #[must_use]
    pub const fn as_element(&self) -> Option<&ElementData> {
        match &self.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Disable a rule on this node.
    pub fn disable_rule(&self, rule: &str) {
        let _ = self.disabled_rules.borrow_mut().insert(rule.to_string());
    }

    /// Disable several rules on this node.
    pub fn disable_rules<S: AsRef<str>>(&self, rules: &[S]) {
        for rule in rules {
            self.disable_rule(rule.as_ref());
        }
    }

    /// Re-enable a rule on this node.
    pub fn enable_rule(&self, rule: &str) {
        let _ = self.disabled_rules.borrow_mut().remove(rule);
    }

    /// Re-enable several rules on this node.
    pub fn enable_rules<S: AsRef<str>>(&self, rules: &[S]) {
        for rule in rules {
            self.enable_rule(rule.as_ref());
        }
    }

    /// Whether `rule` may report on this node.
    #[must_use]
    pub fn rule_enabled(&self, rule: &str) -> bool {
        !self.disabled_rules.borrow().contains(rule)
    }
}

/// Arena-based document tree.
///
/// Besides the nodes, the tree tracks the *active* element during
/// construction (the innermost open element) and the doctype, if one was
/// seen.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes, indexed by `NodeId`. The document node is at index 0.
    nodes: Vec<Node>,
    active: NodeId,
    doctype: Option<String>,
}

impl Index<NodeId> for DomTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl DomTree {
    /// Create a tree holding only the document node.
    #[must_use]
    pub fn new(location: Location) -> Self {
        Self {
            nodes: vec![Node::new(NodeType::Document, location)],
            active: NodeId::ROOT,
            doctype: None,
        }
    }

    /// The root document node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Whether `id` is the document node.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        id == NodeId::ROOT
    }

    /// Get a node by its id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable node by its id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes, detached ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least the document node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node.
    pub fn alloc(&mut self, node_type: NodeType, location: Location) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(node_type, location));
        id
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Create an element. When `parent` is given the element is appended to
    /// it and its depth is one more than the parent's; otherwise the element
    /// stays detached (used for end tags).
    pub fn create_element(
        &mut self,
        tag_name: &str,
        closed: NodeClosed,
        meta: Option<Rc<MetaElement>>,
        parent: Option<NodeId>,
        location: Location,
    ) -> NodeId {
        let depth = parent.map_or(0, |parent| self.depth(parent) + 1);
        let data = ElementData::new(tag_name, closed, meta, depth);
        let id = self.alloc(NodeType::Element(data), location);
        if let Some(parent) = parent {
            self.append_child(parent, id);
        }
        id
    }

    /// Append a text node to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: Value, location: Location) -> NodeId {
        let id = self.alloc(NodeType::Text(text), location);
        self.append_child(parent, id);
        id
    }

    /// The innermost open element (the root when nothing is open).
    #[must_use]
    pub const fn active(&self) -> NodeId {
        self.active
    }

    /// Make `id` the active element.
    pub fn push_active(&mut self, id: NodeId) {
        self.active = id;
    }

    /// Make the parent of the active element active. No-op on the root.
    pub fn pop_active(&mut self) {
        if self.is_root(self.active) {
            return;
        }
        self.active = self.parent(self.active).unwrap_or(NodeId::ROOT);
    }

    /// The doctype value, if a doctype was seen.
    #[must_use]
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Record the doctype value.
    pub fn set_doctype(&mut self, doctype: impl Into<String>) {
        self.doctype = Some(doctype.into());
    }

    /// Location of a node.
    #[must_use]
    pub fn location(&self, id: NodeId) -> &Location {
        &self[id].location
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Element children of a node, in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_element(child))
    }

    /// The first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// The last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Element children of the parent, the node itself included.
    #[must_use]
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.parent(id)
            .map(|parent| self.child_elements(parent).collect())
            .unwrap_or_default()
    }

    /// The element sibling immediately before this node.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let index = siblings.iter().position(|&s| s == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// The element sibling immediately after this node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let index = siblings.iter().position(|&s| s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Element siblings after this node, in document order.
    #[must_use]
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let siblings = self.siblings(id);
        siblings
            .iter()
            .position(|&s| s == id)
            .map(|index| siblings[index + 1..].to_vec())
            .unwrap_or_default()
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Distance from the root: 0 for the root, parent depth + 1 for elements.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Element(data)) => data.depth,
            Some(NodeType::Text(_)) => self.parent(id).map_or(0, |p| self.depth(p) + 1),
            Some(NodeType::Document) | None => 0,
        }
    }

    /// Whether the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.as_element(id).is_some()
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get the text value if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&Value> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(text) => Some(text),
            _ => None,
        })
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// Case-insensitive tag test; `*` matches every element.
    #[must_use]
    pub fn is(&self, id: NodeId, tag_name: &str) -> bool {
        self.as_element(id).is_some_and(|e| e.is(tag_name))
    }

    /// The annotated name of an element, or the node name otherwise.
    #[must_use]
    pub fn annotated_name(&self, id: NodeId) -> String {
        self.as_element(id).map_or_else(
            || self.get(id).map_or_else(String::new, |n| n.node_name().to_string()),
            ElementData::annotated_name,
        )
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.as_text(id) {
            out.push_str(&text.to_string());
            return;
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Whether `rule` may report on this node.
    #[must_use]
    pub fn rule_enabled(&self, id: NodeId, rule: &str) -> bool {
        self.get(id).is_none_or(|n| n.rule_enabled(rule))
    }

    /// Descendant elements matching `tag_name` (`*` for all), in pre-order.
    #[must_use]
    pub fn get_elements_by_tag_name(&self, id: NodeId, tag_name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if let Some(element) = self.as_element(current) {
                if element.is(tag_name) {
                    found.push(current);
                }
                stack.extend(self.children(current).iter().rev().copied());
            }
        }
        found
    }

    /// Visit every element below the root, children before their parent.
    pub fn visit_depth_first(&self, mut callback: impl FnMut(NodeId)) {
        self.visit_children(NodeId::ROOT, &mut callback);
    }

    fn visit_children(&self, id: NodeId, callback: &mut impl FnMut(NodeId)) {
        for child in self.child_elements(id) {
            self.visit_children(child, callback);
            callback(child);
        }
    }

    /// Whether any descendant element satisfies `predicate`.
    pub fn some_children(&self, id: NodeId, mut predicate: impl FnMut(NodeId) -> bool) -> bool {
        self.find(id, &mut predicate).is_some()
    }

    /// Whether every descendant element satisfies `predicate`.
    pub fn every_children(&self, id: NodeId, mut predicate: impl FnMut(NodeId) -> bool) -> bool {
        self.find(id, |node| !predicate(node)).is_none()
    }

    /// First descendant element (pre-order) satisfying `predicate`.
    pub fn find(&self, id: NodeId, mut predicate: impl FnMut(NodeId) -> bool) -> Option<NodeId> {
        self.get_elements_by_tag_name(id, "*")
            .into_iter()
            .find(|&node| predicate(node))
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
