use markcheck_html::ParserEvent;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Disallows attributes the element's metadata lists as deprecated.
struct NoDeprecatedAttr;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(NoDeprecatedAttr))
}

impl Rule for NoDeprecatedAttr {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("attr", |rule, event, tree| {
            let ParserEvent::Attr { target, key, .. } = event else {
                return;
            };
            let Some(element) = tree.as_element(*target) else {
                return;
            };
            let Some(meta) = rule.meta().get_meta_for(&element.tag_name) else {
                return;
            };
            let key = key.to_ascii_lowercase();
            if meta.deprecated_attributes.contains(&key) {
                let tag = element.tag_name.to_ascii_lowercase();
                let message = format!("Attribute \"{key}\" is deprecated on <{tag}> element");
                rule.report(tree, Some(*target), message);
            }
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new("HTML5 deprecated many old attributes."))
    }
}
