use markcheck_dom::{DomTree, NodeClosed, NodeId};
use markcheck_html::ParserEvent;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle, parse_options};

/// How void elements must be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoidStyle {
    /// `<br>`
    #[default]
    Omit,
    /// `<br/>`
    SelfClose,
    /// Either form.
    Any,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VoidOptions {
    style: VoidStyle,
}

/// Void elements must not have end tags, non-void elements must not be
/// self-closed, and void elements follow the configured style.
struct Void {
    style: VoidStyle,
}

pub(super) fn create(name: &str, options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    let options: VoidOptions = parse_options(name, options)?;
    Ok(Box::new(Void { style: options.style }))
}

impl Rule for Void {
    fn setup(&self, rule: &RuleHandle) {
        let style = self.style;
        rule.on("tag:close", move |rule, event, tree| {
            let ParserEvent::TagClose { target, previous, .. } = event else {
                return;
            };
            if let Some(target) = *target {
                validate_current(rule, tree, target);
            }
            validate_active(rule, tree, *previous, style);
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "HTML void elements cannot have any content and must not have an end tag.",
        ))
    }
}

/// The node built from the closing tag: a void element never has one.
fn validate_current(rule: &RuleHandle, tree: &DomTree, node: NodeId) {
    let Some(element) = tree.as_element(node) else {
        return;
    };
    if element.meta.is_some() && element.void_element && element.closed == NodeClosed::EndTag {
        let message = format!("End tag for <{}> must be omitted", element.tag_name);
        rule.report_with(tree, None, message, Some(tree.location(node)), None);
    }
}

/// The element being closed.
fn validate_active(rule: &RuleHandle, tree: &DomTree, node: NodeId, style: VoidStyle) {
    let Some(element) = tree.as_element(node) else {
        return;
    };
    let Some(meta) = element.meta.as_deref() else {
        return;
    };
    if meta.foreign {
        return;
    }
    let tag = &element.tag_name;
    let message = match (element.closed, element.void_element, style) {
        (NodeClosed::VoidSelfClosed, true, VoidStyle::Omit) => {
            format!("Expected omitted end tag <{tag}> instead of self-closing element <{tag}/>")
        }
        (NodeClosed::VoidOmitted, true, VoidStyle::SelfClose) => {
            format!("Expected self-closing element <{tag}/> instead of omitted end-tag <{tag}>")
        }
        (NodeClosed::VoidOmitted | NodeClosed::VoidSelfClosed, false, _) => {
            format!("End tag for <{tag}> must not be omitted")
        }
        _ => return,
    };
    rule.report(tree, Some(node), message);
}
