//! Rule engine for markcheck.
//!
//! This crate provides:
//! - **Configuration** - [`Config`] and [`Severity`], parsed from JSON
//! - **Rule contract** - the [`Rule`] trait, the per-session [`RuleHandle`]
//!   and the name to factory [`RuleRegistry`]
//! - **Directives** - inline `<!-- [html-validate-...] -->` comments that
//!   enable or disable rules for a region of a document
//! - **Engine** - [`Engine::lint`], which ties parser, rules and
//!   [`Reporter`] together, plus diagnostic dumps
//! - **Built-in rules** - see [`rules::BUILTIN_RULES`]
//!
//! ```no_run
//! use markcheck_engine::{Config, Engine};
//! use markcheck_html::Source;
//!
//! let engine = Engine::new(Config::recommended())?;
//! let report = engine.lint(&[Source::new("<p>hello</p>", "inline")])?;
//! assert!(!report.valid);
//! # Ok::<(), markcheck_engine::EngineError>(())
//! ```

pub mod config;
mod directive;
pub mod engine;
pub mod reporter;
pub mod rule;
pub mod rules;
pub mod severity;

pub use config::{Config, ConfigError, RuleConfig};
pub use engine::{Engine, EventDump, TokenDump};
pub use reporter::{FileResult, Message, PARSER_ERROR, Report, Reporter};
pub use rule::{Rule, RuleDocumentation, RuleFactory, RuleHandle, RuleRegistry};
pub use severity::Severity;

use markcheck_html::ParseError;
use markcheck_meta::MetaError;
use thiserror::Error;

/// Errors that abort a lint run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A metadata catalog is invalid.
    #[error(transparent)]
    Meta(#[from] MetaError),

    /// A document could not be processed at all.
    #[error(transparent)]
    Parse(#[from] ParseError),
}
