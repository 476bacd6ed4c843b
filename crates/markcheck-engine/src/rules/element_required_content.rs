use markcheck_meta::validator::validate_required_content;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Elements must contain the children their metadata marks as required.
struct ElementRequiredContent;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(ElementRequiredContent))
}

impl Rule for ElementRequiredContent {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            tree.visit_depth_first(|node| {
                let Some(rules) = tree
                    .as_element(node)
                    .and_then(|el| el.meta.as_deref())
                    .and_then(|meta| meta.required_content.as_deref())
                else {
                    return;
                };
                for missing in validate_required_content(tree, node, Some(rules)) {
                    let message = format!(
                        "{} element must have <{missing}> as content",
                        tree.annotated_name(node)
                    );
                    rule.report(tree, Some(node), message);
                }
            });
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Some elements has requirements on content that must be present.",
        ))
    }
}
