//! Element metadata for markcheck.
//!
//! This crate provides:
//! - **Catalog** - [`MetaTable`], mapping tag names to [`MetaElement`] records
//!   loaded from JSON, with `inherit` support and computed properties
//! - **Validator** - pure content-model checks used by the built-in rules
//! - **HTML5 subset** - a bundled catalog covering the common HTML elements
//!
//! [`MetaElement`]: markcheck_dom::MetaElement

pub mod table;
pub mod validator;

pub use table::MetaTable;

use thiserror::Error;

/// Errors raised while loading a metadata catalog.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The document is not valid JSON.
    #[error("failed to parse element metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not an object keyed by tag name.
    #[error("element metadata must be an object mapping tag names to records")]
    NotAnObject,

    /// A record failed to deserialize (unknown field, bad category, bad
    /// permitted rule, invalid selector or pattern).
    #[error("invalid metadata for <{tag}>: {source}")]
    Element {
        /// Tag whose record is invalid.
        tag: String,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// A record inherits from a tag that is never defined.
    #[error("element <{tag}> cannot inherit from unknown element <{parent}>")]
    UnknownInherit {
        /// The inheriting tag.
        tag: String,
        /// The missing parent tag.
        parent: String,
    },

    /// A computed property names an unknown function.
    #[error("unknown property expression \"{function}\" on <{tag}>")]
    UnknownExpression {
        /// Tag carrying the expression.
        tag: String,
        /// The unknown function name.
        function: String,
    },

    /// A computed property has a malformed argument.
    #[error("invalid argument to \"{function}\" on <{tag}>: {reason}")]
    InvalidExpression {
        /// Tag carrying the expression.
        tag: String,
        /// The function name.
        function: String,
        /// What is wrong with the argument.
        reason: &'static str,
    },
}
