//! Tokenizer module.
//!
//! The lexer tests an ordered list of [`matchers`] per state against the
//! remaining input; the first match decides the token, the next state and
//! how much input is consumed.

/// Tokenizer state machine.
pub mod lexer;
/// Pattern matchers used by the state machine.
pub mod matchers;
/// Token types produced by the lexer.
pub mod token;

pub use lexer::Lexer;
pub use token::{InvalidTokenError, Token, TokenKind};
