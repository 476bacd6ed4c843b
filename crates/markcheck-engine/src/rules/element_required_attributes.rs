use markcheck_html::ParserEvent;
use serde_json::{Value, json};

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Elements must carry the attributes their metadata marks as required.
struct ElementRequiredAttributes;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(ElementRequiredAttributes))
}

impl Rule for ElementRequiredAttributes {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("tag:close", |rule, event, tree| {
            let ParserEvent::TagClose { previous, .. } = event else {
                return;
            };
            let node = *previous;
            let Some(element) = tree.as_element(node) else {
                return;
            };
            let Some(meta) = element.meta.as_deref() else {
                return;
            };
            let location = tree.location(node);
            for key in &meta.required_attributes {
                if element.has_attribute(key) {
                    continue;
                }
                let message = format!(
                    "{} is missing required \"{key}\" attribute",
                    element.annotated_name()
                );
                let context = json!({
                    "element": element.tag_name.to_ascii_lowercase(),
                    "attribute": key,
                });
                rule.report_with(tree, Some(node), message, Some(location), Some(context));
            }
        });
    }

    fn documentation(&self, context: Option<&Value>) -> Option<RuleDocumentation> {
        let description = match context {
            Some(context) => {
                let field = |key: &str| context.get(key).and_then(Value::as_str).unwrap_or_default();
                format!(
                    "The <{}> element is required to have a \"{}\" attribute.",
                    field("element"),
                    field("attribute")
                )
            }
            None => "Element is missing a required attribute".to_string(),
        };
        Some(RuleDocumentation::new(description))
    }
}
