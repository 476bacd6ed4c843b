use markcheck_dom::{DomTree, NodeId};
use markcheck_meta::validator::{find_unpermitted_content, validate_ancestors, validate_permitted};
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Children and descendants must be allowed by the content models of their
/// parent and ancestors, and required ancestors must be present.
struct ElementPermittedContent;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(ElementPermittedContent))
}

impl Rule for ElementPermittedContent {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            tree.visit_depth_first(|node| {
                let Some(parent) = tree.parent(node) else {
                    return;
                };
                if tree.is_root(parent) {
                    return;
                }
                let has_meta = tree
                    .as_element(parent)
                    .is_some_and(|parent| parent.meta.is_some());
                if !has_meta {
                    return;
                }
                if validate_content(rule, tree, node, parent) || validate_descendant(rule, tree, node) {
                    return;
                }
                validate_required_ancestors(rule, tree, node);
            });
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Some elements has restrictions on what content is allowed. This can include both direct children or descendant elements.",
        ))
    }
}

fn validate_content(rule: &RuleHandle, tree: &DomTree, node: NodeId, parent: NodeId) -> bool {
    let Some(rules) = tree
        .as_element(parent)
        .and_then(|parent| parent.meta.as_deref())
        .and_then(|meta| meta.permitted_content.as_deref())
    else {
        return false;
    };
    let offenders = find_unpermitted_content(tree, node, Some(rules));
    for &offender in &offenders {
        let tag = tree.tag_name(offender).unwrap_or_default();
        let message = format!(
            "Element <{tag}> is not permitted as content in {}",
            tree.annotated_name(parent)
        );
        rule.report(tree, Some(offender), message);
    }
    !offenders.is_empty()
}

fn validate_descendant(rule: &RuleHandle, tree: &DomTree, node: NodeId) -> bool {
    if tree.as_element(node).and_then(|el| el.meta.as_ref()).is_none() {
        return false;
    }
    for ancestor in tree.ancestors(node) {
        if tree.is_root(ancestor) {
            break;
        }
        let Some(rules) = tree
            .as_element(ancestor)
            .and_then(|el| el.meta.as_deref())
            .and_then(|meta| meta.permitted_descendants.as_deref())
        else {
            continue;
        };
        if validate_permitted(tree, node, Some(rules)) {
            continue;
        }
        let tag = tree.tag_name(node).unwrap_or_default();
        let message = format!(
            "Element <{tag}> is not permitted as descendant of {}",
            tree.annotated_name(ancestor)
        );
        rule.report(tree, Some(node), message);
        return true;
    }
    false
}

fn validate_required_ancestors(rule: &RuleHandle, tree: &DomTree, node: NodeId) {
    let Some(rules) = tree
        .as_element(node)
        .and_then(|el| el.meta.as_deref())
        .and_then(|meta| meta.required_ancestors.as_deref())
    else {
        return;
    };
    let Some(first) = rules.first() else {
        return;
    };
    if !validate_ancestors(tree, node, Some(rules)) {
        let tag = tree.tag_name(node).unwrap_or_default();
        rule.report(tree, Some(node), format!("Element <{tag}> requires an \"{first}\" ancestor"));
    }
}
