//! Content-model checks.
//!
//! Every function here is pure: it reads the tree and the rules it is given
//! and reports whether they hold. Rules decide what to do with the answer.

use std::collections::BTreeMap;

use markcheck_dom::meta::{AttributePattern, PermittedEntry, PermittedToken};
use markcheck_dom::{Attribute, DomTree, NodeId, Selector, Value};

/// Whether `node` is allowed by `rules`.
///
/// No rules means anything goes; an empty list permits nothing. Otherwise at
/// least one entry must hold.
#[must_use]
pub fn validate_permitted(tree: &DomTree, node: NodeId, rules: Option<&[PermittedEntry]>) -> bool {
    let Some(rules) = rules else {
        return true;
    };
    rules.iter().any(|rule| validate_entry(tree, node, rule))
}

fn validate_entry(tree: &DomTree, node: NodeId, entry: &PermittedEntry) -> bool {
    match entry {
        PermittedEntry::Token(token) => validate_permitted_category(tree, node, token),
        PermittedEntry::AllOf(group) => group.iter().all(|inner| validate_entry(tree, node, inner)),
        PermittedEntry::Exclude(group) => !group
            .exclude
            .as_slice()
            .iter()
            .any(|inner| validate_entry(tree, node, inner)),
    }
}

/// Whether `node` matches a single token.
///
/// Tag tokens compare the tag name. Category tokens consult the element's
/// metadata; an element without metadata matches every category.
#[must_use]
pub fn validate_permitted_category(tree: &DomTree, node: NodeId, token: &PermittedToken) -> bool {
    match token {
        PermittedToken::Tag { name, .. } => tree.is(node, name),
        PermittedToken::Category(category) => tree
            .as_element(node)
            .and_then(|el| el.meta.as_deref())
            .is_none_or(|meta| meta.in_category(*category)),
    }
}

/// Whether `node` appears no more often than its tag token allows.
///
/// `num_siblings` counts the siblings sharing the tag, the node included.
/// Tags not listed in `rules` are unlimited.
#[must_use]
pub fn validate_occurrences(
    tree: &DomTree,
    node: NodeId,
    rules: Option<&[PermittedEntry]>,
    num_siblings: usize,
) -> bool {
    let (Some(rules), Some(tag)) = (rules, tree.tag_name(node)) else {
        return true;
    };
    let limit = rules.iter().find_map(|entry| match entry {
        PermittedEntry::Token(PermittedToken::Tag { name, limit }) if name == tag => Some(*limit),
        _ => None,
    });
    limit.flatten().is_none_or(|limit| num_siblings <= limit)
}

/// Check that `children` follow the order given by `rules`.
///
/// A cursor walks the rule list: each child advances it to the first token
/// the child matches. A child that matches no token at or after the cursor
/// but does match an earlier one is out of order; `callback` receives it and
/// the previous child, and checking stops. Children matching no token at all
/// are ignored.
pub fn validate_order(
    tree: &DomTree,
    children: &[NodeId],
    rules: Option<&[PermittedToken]>,
    mut callback: impl FnMut(NodeId, Option<NodeId>),
) -> bool {
    let Some(rules) = rules else {
        return true;
    };
    let mut cursor = 0;
    let mut prev = None;
    for &node in children {
        let old = cursor;
        while cursor < rules.len() && !validate_permitted_category(tree, node, &rules[cursor]) {
            cursor += 1;
        }
        if cursor >= rules.len() {
            let order_specified = rules
                .iter()
                .any(|token| validate_permitted_category(tree, node, token));
            if order_specified {
                callback(node, prev);
                return false;
            }
            cursor = old;
        }
        prev = Some(node);
    }
    true
}

/// Whether one of `rules` matches `node` or one of its ancestors.
#[must_use]
pub fn validate_ancestors(tree: &DomTree, node: NodeId, rules: Option<&[Selector]>) -> bool {
    match rules {
        None | Some([]) => true,
        Some(rules) => rules.iter().any(|rule| tree.closest(node, rule).is_some()),
    }
}

/// The tags from `rules` missing among the children of `node`.
#[must_use]
pub fn validate_required_content(tree: &DomTree, node: NodeId, rules: Option<&[String]>) -> Vec<String> {
    let Some(rules) = rules else {
        return Vec::new();
    };
    rules
        .iter()
        .filter(|tag| !tree.child_elements(node).any(|child| tree.is(child, tag)))
        .cloned()
        .collect()
}

/// Whether `attr` has a value allowed by `rules`.
///
/// - attributes without a rule and dynamic values always pass
/// - an empty rule marks a boolean attribute: no value, `""` or the
///   attribute's own name
/// - a rule containing `""` accepts a missing or empty value
/// - otherwise the value must match one of the patterns
#[must_use]
pub fn validate_attribute(attr: &Attribute, rules: &BTreeMap<String, Vec<AttributePattern>>) -> bool {
    let Some(rule) = rules.get(&attr.key) else {
        return true;
    };
    let value = match &attr.value {
        Some(Value::Dynamic(_)) => return true,
        Some(Value::Static(value)) => Some(value.as_str()),
        None => None,
    };
    let empty = value.is_none_or(str::is_empty);

    if rule.is_empty() {
        return empty || value == Some(attr.key.as_str());
    }
    if empty && rule.iter().any(AttributePattern::is_empty_literal) {
        return true;
    }
    value.is_some_and(|value| rule.iter().any(|pattern| pattern.matches(value)))
}

/// Elements under a parent with content `rules` that violate them.
///
/// `node` is reported when it fails. A transparent `node` that passes is
/// looked through: its children are checked against the same rules, and so
/// on down.
#[must_use]
pub fn find_unpermitted_content(
    tree: &DomTree,
    node: NodeId,
    rules: Option<&[PermittedEntry]>,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    collect_unpermitted(tree, node, rules, &mut found);
    found
}

fn collect_unpermitted(
    tree: &DomTree,
    node: NodeId,
    rules: Option<&[PermittedEntry]>,
    found: &mut Vec<NodeId>,
) {
    if !validate_permitted(tree, node, rules) {
        found.push(node);
        return;
    }
    let transparent = tree
        .as_element(node)
        .and_then(|el| el.meta.as_deref())
        .is_some_and(|meta| meta.transparent);
    if transparent {
        for child in tree.child_elements(node) {
            collect_unpermitted(tree, child, rules, found);
        }
    }
}
