//! Parser module for tree construction.

/// Tree builder and the public parser handle.
pub mod builder;
/// IE conditional comment extraction.
pub mod conditional;
/// Parse failures.
pub mod error;
/// Events emitted while parsing.
pub mod event;
/// Source documents and transform hooks.
pub mod source;

pub use builder::Parser;
pub use error::{ParseError, ParserError};
pub use event::ParserEvent;
pub use source::{AttributeData, Source, SourceHooks};
