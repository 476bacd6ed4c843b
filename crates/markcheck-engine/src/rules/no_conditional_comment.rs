use serde_json::Value;

use crate::config::ConfigError;
use crate::rule::{Rule, RuleDocumentation, RuleHandle};

/// Disallows IE conditional comments.
struct NoConditionalComment;

pub(super) fn create(_name: &str, _options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(NoConditionalComment))
}

impl Rule for NoConditionalComment {
    fn setup(&self, rule: &RuleHandle) {
        rule.on("conditional", |rule, _, tree| {
            rule.report(tree, None, "Use of conditional comments are deprecated");
        });
    }

    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        Some(RuleDocumentation::new(
            "Microsoft Internet Explorer previously supported using special HTML comments (conditional comments) for targeting specific versions of IE but since IE 10 it is deprecated and not supported in standards mode.",
        ))
    }
}
