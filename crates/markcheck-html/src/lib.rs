//! HTML tokenizer and parser for markcheck.
//!
//! # Scope
//!
//! This crate implements:
//! - **Tokenizer** - a pattern-driven state machine producing a lazy stream
//!   of typed tokens with source locations
//!   - Initial, doctype, text, tag, attribute, CDATA and script states
//!   - Comments, IE conditional comments, directives and templating fragments
//!
//! - **Parser / Tree Builder** - consumes the token stream, builds a
//!   [`DomTree`](markcheck_dom::DomTree) and emits structural events
//!   - Optional end tags, void and foreign elements
//!   - Attribute and element transform hooks supplied by the [`Source`]
//!   - Directive comments
//!
//! # Not Implemented
//!
//! - The WHATWG insertion-mode table, foster parenting and the adoption
//!   agency algorithm
//! - Character reference decoding

/// Tree building and event emission.
pub mod parser;
/// Lexical analysis.
pub mod tokenizer;

pub use parser::{
    AttributeData, ParseError, Parser, ParserError, ParserEvent, Source, SourceHooks,
};
pub use tokenizer::{InvalidTokenError, Lexer, Token, TokenKind};
