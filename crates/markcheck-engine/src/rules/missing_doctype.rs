use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// The document must start with a doctype.
struct MissingDoctype;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(MissingDoctype))
}

impl Rule for MissingDoctype {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("dom:ready", |rule, _, tree| {
            if tree.doctype().is_none() {
                rule.report(tree, Some(tree.root()), "Document is missing doctype");
            }
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Requires that the document contains a doctype.",
        ))
    }
}
