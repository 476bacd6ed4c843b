use markcheck_common::Location;
use thiserror::Error;

use crate::tokenizer::InvalidTokenError;

/// The token stream ended or was malformed in a way the tree builder cannot
/// recover from, e.g. an unterminated tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParserError {
    /// Where the unfinished construct started.
    pub location: Location,
    /// What was expected.
    pub message: String,
}

/// Why parsing a document failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer could not match the input.
    #[error(transparent)]
    Token(#[from] InvalidTokenError),

    /// The parser ran out of tokens.
    #[error(transparent)]
    Stream(#[from] ParserError),

    /// A directive comment could not be parsed.
    #[error("Failed to parse directive \"{directive}\"")]
    Directive {
        /// The directive body.
        directive: String,
        /// Location of the directive comment.
        location: Location,
    },
}

impl ParseError {
    /// Where parsing stopped.
    #[must_use]
    pub const fn location(&self) -> &Location {
        match self {
            Self::Token(err) => &err.location,
            Self::Stream(err) => &err.location,
            Self::Directive { location, .. } => location,
        }
    }

    /// Whether the failure is a property of the markup, to be reported as a
    /// `parser-error` message rather than aborting the run.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Token(_) | Self::Stream(_))
    }
}
