use markcheck_meta::validator::validate_order;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Children must follow the order required by the parent's metadata.
struct ElementPermittedOrder;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(ElementPermittedOrder))
}

impl Rule for ElementPermittedOrder {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            tree.visit_depth_first(|node| {
                let Some(rules) = tree
                    .as_element(node)
                    .and_then(|el| el.meta.as_deref())
                    .and_then(|meta| meta.permitted_order.as_deref())
                else {
                    return;
                };
                let children: Vec<_> = tree.child_elements(node).collect();
                let _ = validate_order(tree, &children, Some(rules), |child, prev| {
                    let tag = tree.tag_name(child).unwrap_or_default();
                    let prev = prev.and_then(|prev| tree.tag_name(prev)).unwrap_or_default();
                    let message = format!("Element <{tag}> must be used before <{prev}> in this context");
                    rule.report(tree, Some(child), message);
                });
            });
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Some elements has a specific order the children must use.",
        ))
    }
}
