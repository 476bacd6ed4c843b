//! Built-in rules.
//!
//! Each rule is a small consumer of the [`Rule`](crate::rule::Rule)
//! contract: it subscribes to parser events in `setup` and reports through
//! its [`RuleHandle`](crate::rule::RuleHandle).

mod attribute_allowed_values;
mod element_permitted_content;
mod element_permitted_occurrences;
mod element_permitted_order;
mod element_required_attributes;
mod element_required_content;
mod missing_doctype;
mod no_conditional_comment;
mod no_deprecated_attr;
mod no_dup_attr;
mod no_implicit_close;
mod void;

pub use void::VoidStyle;

use crate::rule::{RuleFactory, RuleRegistry};

/// Names and factories of the built-in rules.
const BUILTIN: [(&str, RuleFactory); 12] = [
    ("attribute-allowed-values", attribute_allowed_values::create),
    ("element-permitted-content", element_permitted_content::create),
    ("element-permitted-occurrences", element_permitted_occurrences::create),
    ("element-permitted-order", element_permitted_order::create),
    ("element-required-attributes", element_required_attributes::create),
    ("element-required-content", element_required_content::create),
    ("missing-doctype", missing_doctype::create),
    ("no-conditional-comment", no_conditional_comment::create),
    ("no-deprecated-attr", no_deprecated_attr::create),
    ("no-dup-attr", no_dup_attr::create),
    ("no-implicit-close", no_implicit_close::create),
    ("void", void::create),
];

/// Ids of every built-in rule.
pub const BUILTIN_RULES: [&str; 12] = [
    "attribute-allowed-values",
    "element-permitted-content",
    "element-permitted-occurrences",
    "element-permitted-order",
    "element-required-attributes",
    "element-required-content",
    "missing-doctype",
    "no-conditional-comment",
    "no-deprecated-attr",
    "no-dup-attr",
    "no-implicit-close",
    "void",
];

pub(crate) fn register_builtin(registry: &mut RuleRegistry) {
    for (name, factory) in BUILTIN {
        registry.register(name, factory);
    }
}
