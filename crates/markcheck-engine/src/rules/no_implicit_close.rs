use markcheck_dom::NodeClosed;
use markcheck_html::ParserEvent;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Disallows relying on omitted optional end tags.
struct NoImplicitClose;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(NoImplicitClose))
}

impl Rule for NoImplicitClose {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("tag:close", |rule, event, tree| {
            let ParserEvent::TagClose { target, previous, .. } = event else {
                return;
            };
            let closed = *previous;
            let Some(element) = tree.as_element(closed) else {
                return;
            };
            if element.closed != NodeClosed::ImplicitClosed {
                return;
            }
            let tag = &element.tag_name;
            let location = tree.location(closed);
            let Some(by) = target.and_then(|target| tree.tag_name(target)) else {
                return;
            };
            let parent = tree.parent(closed).and_then(|parent| tree.tag_name(parent));

            let message = if parent.is_some_and(|parent| parent.eq_ignore_ascii_case(by)) {
                format!("Element <{tag}> is implicitly closed by parent </{by}>")
            } else if tag.eq_ignore_ascii_case(by) {
                format!("Element <{tag}> is implicitly closed by sibling")
            } else {
                format!("Element <{tag}> is implicitly closed by adjacent <{by}>")
            };
            rule.report_with(tree, Some(closed), message, Some(location), None);
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Some elements in HTML has optional end tags. When an optional tag is omitted a browser must handle it as if the end tag was present.",
        ))
    }
}
