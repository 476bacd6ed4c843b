use markcheck_meta::validator::validate_attribute;
use serde_json::{Value, json};

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Attribute values must be one of the values the element's metadata allows.
struct AttributeAllowedValues;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(AttributeAllowedValues))
}

impl Rule for AttributeAllowedValues {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            tree.visit_depth_first(|node| {
                let Some(element) = tree.as_element(node) else {
                    return;
                };
                let Some(meta) = element.meta.as_deref() else {
                    return;
                };
                if meta.attributes.is_empty() {
                    return;
                }
                for attr in element.attributes() {
                    if validate_attribute(attr, &meta.attributes) {
                        continue;
                    }
                    let allowed: Vec<String> = meta
                        .attributes
                        .get(&attr.key)
                        .map(|patterns| patterns.iter().map(ToString::to_string).collect())
                        .unwrap_or_default();
                    let value = attr.value.as_ref().map(ToString::to_string);
                    let context = json!({
                        "element": element.tag_name.to_ascii_lowercase(),
                        "attribute": attr.key,
                        "value": value,
                        "allowed": allowed,
                    });
                    let (message, location) = match &value {
                        Some(value) => (
                            format!("Attribute \"{}\" has invalid value \"{value}\"", attr.key),
                            attr.value_location.as_ref().unwrap_or(&attr.key_location),
                        ),
                        None => (
                            format!("Attribute \"{}\" is missing value", attr.key),
                            &attr.key_location,
                        ),
                    };
                    rule.report_with(tree, Some(node), message, Some(location), Some(context));
                }
            });
        });
    }

    fn documentation(&self, context: Option<&Value>) -> Option<RuleDocumentation> {
        let Some(context) = context else {
            return Some(RuleDocumentation::new("Attribute has invalid value."));
        };
        let field = |key: &str| context.get(key).and_then(Value::as_str).unwrap_or_default();
        let element = field("element");
        let attribute = field("attribute");
        let allowed: Vec<&str> = context
            .get("allowed")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let description = if allowed.is_empty() {
            format!(
                "Element <{element}> attribute `{attribute}` must be a boolean attribute, e.g. `<{element} {attribute}>`"
            )
        } else {
            let list: Vec<String> = allowed.iter().map(|value| format!("- `{value}`")).collect();
            format!(
                "Element <{element}> does not allow attribute `{attribute}` to have the value `\"{}\"`, it must match one of the following:\n\n{}",
                field("value"),
                list.join("\n")
            )
        };
        Some(RuleDocumentation::new(description))
    }
}
