use markcheck_meta::validator::validate_occurrences;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Elements with an occurrence limit in their parent's content model must
/// not repeat.
struct ElementPermittedOccurrences;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(ElementPermittedOccurrences))
}

impl Rule for ElementPermittedOccurrences {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            tree.visit_depth_first(|node| {
                let Some(rules) = tree
                    .as_element(node)
                    .and_then(|el| el.meta.as_deref())
                    .and_then(|meta| meta.permitted_content.as_deref())
                else {
                    return;
                };
                let children: Vec<_> = tree.child_elements(node).collect();
                for &child in &children {
                    let Some(tag) = tree.tag_name(child) else {
                        continue;
                    };
                    let siblings: Vec<_> = children
                        .iter()
                        .copied()
                        .filter(|&other| tree.is(other, tag))
                        .collect();
                    if siblings.first() == Some(&child) {
                        continue;
                    }
                    if !validate_occurrences(tree, child, Some(rules), siblings.len()) {
                        let message = format!(
                            "Element <{tag}> can only appear once under {}",
                            tree.annotated_name(node)
                        );
                        rule.report(tree, Some(child), message);
                    }
                }
            });
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Some elements may only be used a fixed amount of times in given context.",
        ))
    }
}
