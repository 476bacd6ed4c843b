use markcheck_common::Location;
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// `<!DOCTYPE` followed by one whitespace character.
    DoctypeOpen,
    /// The doctype value, e.g. `html`.
    DoctypeValue,
    /// The `>` ending a doctype.
    DoctypeClose,
    /// A line break, or a run of spaces and tabs optionally followed by one.
    Whitespace,
    /// Character data.
    Text,
    /// `<tag` or `</tag`. Captures: the slash (possibly empty) and the name.
    TagOpen,
    /// `>` or `/>`.
    TagClose,
    /// An attribute name. Captures: the name.
    AttrName,
    /// `="value"`, `='value'` or `=value`. Captures: the value and the quote,
    /// the latter absent for unquoted values.
    AttrValue,
    /// A markcheck directive comment. Captures: the directive body.
    Directive,
    /// `<![if ...]>` style markup outside a comment. Captures: the condition.
    Conditional,
    /// `<!-- ... -->`. Captures: the comment body.
    Comment,
    /// `<% %>`, `<? ?>` or `<$ $>`.
    Templating,
    /// The body of a `<script>` element.
    Script,
    /// End of input. Always the last token and always zero-sized.
    Eof,
}

/// A lexical token.
///
/// `data[0]` is the complete slice of input the token consumed; later
/// entries are the captures described on [`TokenKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Where the token starts; `size` is the byte length of `data[0]`.
    pub location: Location,
    /// The matched text followed by its captures.
    pub data: Vec<&'a str>,
}

impl<'a> Token<'a> {
    /// The complete slice of input this token consumed.
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.data.first().copied().unwrap_or_default()
    }

    /// A capture by index (1-based, like the token's `data`).
    #[must_use]
    pub fn capture(&self, index: usize) -> Option<&'a str> {
        self.data.get(index).copied()
    }
}

/// The lexer could not match the remaining input.
///
/// Fatal for the current document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidTokenError {
    /// Where tokenization stopped.
    pub location: Location,
    /// What the lexer expected to find.
    pub message: String,
}
