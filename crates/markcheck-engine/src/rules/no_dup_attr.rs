use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use markcheck_html::ParserEvent;
use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Disallows repeating an attribute on the same element.
struct NoDupAttr;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(NoDupAttr))
}

impl Rule for NoDupAttr {
    fn setup(&self, rule: &RuleHandle) {
        let seen: Rc<RefCell<HashSet<String>>> = Rc::default();

        let reset = Rc::clone(&seen);
        rule.on("tag:open", move |_, _, _| reset.borrow_mut().clear());

        rule.on("attr", move |rule, event, tree| {
            let ParserEvent::Attr {
                target,
                key,
                original_attribute,
                ..
            } = event
            else {
                return;
            };
            // Attributes synthesized by a transform may legitimately repeat.
            if original_attribute.is_some() {
                return;
            }
            let name = key.to_ascii_lowercase();
            if !seen.borrow_mut().insert(name.clone()) {
                rule.report(tree, Some(*target), format!("Attribute \"{name}\" duplicated"));
            }
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "HTML disallows two or more attributes with the same (case-insensitive) name.",
        ))
    }
}
