use markcheck_common::Location;
use strum_macros::Display;

use super::matchers::{self, Captures, Matcher};
use super::token::{InvalidTokenError, Token, TokenKind};

/// Lexer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Start of input: XML declaration, doctype or leading whitespace.
    Initial,
    /// Inside `<!DOCTYPE ...>`.
    Doctype,
    /// Character data and markup.
    Text,
    /// Inside a tag, between attributes.
    Tag,
    /// After an attribute name.
    Attr,
    /// Inside `<![CDATA[ ... ]]>`.
    Cdata,
    /// Inside a `<script>` body.
    Script,
}

/// How the content after a start tag is tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentModel {
    Text,
    Script,
}

/// Where a matching pattern sends the lexer.
#[derive(Debug, Clone, Copy)]
enum Next {
    To(State),
    /// Leaving a tag: text, or script data after `<script>`.
    AfterTag,
}

/// One entry in a state's pattern list. `None` matches without consuming.
type Rule = (Option<Matcher>, Next, Option<TokenKind>);

const INITIAL: &[Rule] = &[
    (Some(matchers::xml_tag), Next::To(State::Initial), None),
    (Some(matchers::doctype_open), Next::To(State::Doctype), Some(TokenKind::DoctypeOpen)),
    (Some(matchers::whitespace), Next::To(State::Initial), Some(TokenKind::Whitespace)),
    (None, Next::To(State::Text), None),
];

const DOCTYPE: &[Rule] = &[
    (Some(matchers::whitespace), Next::To(State::Doctype), Some(TokenKind::Whitespace)),
    (Some(matchers::doctype_value), Next::To(State::Doctype), Some(TokenKind::DoctypeValue)),
    (Some(matchers::doctype_close), Next::To(State::Text), Some(TokenKind::DoctypeClose)),
];

const TAG: &[Rule] = &[
    (Some(matchers::tag_close), Next::AfterTag, Some(TokenKind::TagClose)),
    (Some(matchers::attr_start), Next::To(State::Attr), Some(TokenKind::AttrName)),
    (Some(matchers::whitespace), Next::To(State::Tag), Some(TokenKind::Whitespace)),
];

const ATTR: &[Rule] = &[
    (Some(matchers::attr_single), Next::To(State::Tag), Some(TokenKind::AttrValue)),
    (Some(matchers::attr_double), Next::To(State::Tag), Some(TokenKind::AttrValue)),
    (Some(matchers::attr_unquoted), Next::To(State::Tag), Some(TokenKind::AttrValue)),
    (None, Next::To(State::Tag), None),
];

const TEXT: &[Rule] = &[
    (Some(matchers::whitespace), Next::To(State::Text), Some(TokenKind::Whitespace)),
    (Some(matchers::cdata_begin), Next::To(State::Cdata), None),
    (Some(matchers::directive), Next::To(State::Text), Some(TokenKind::Directive)),
    (Some(matchers::conditional), Next::To(State::Text), Some(TokenKind::Conditional)),
    (Some(matchers::comment), Next::To(State::Text), Some(TokenKind::Comment)),
    (Some(matchers::templating), Next::To(State::Text), Some(TokenKind::Templating)),
    (Some(matchers::tag_open), Next::To(State::Tag), Some(TokenKind::TagOpen)),
    (Some(matchers::text), Next::To(State::Text), Some(TokenKind::Text)),
];

const CDATA: &[Rule] = &[(Some(matchers::cdata_end), Next::To(State::Text), None)];

const SCRIPT: &[Rule] = &[
    (Some(matchers::script_end), Next::To(State::Tag), Some(TokenKind::TagOpen)),
    (Some(matchers::script_data), Next::To(State::Script), Some(TokenKind::Script)),
];

/// Longest excerpt of the offending line quoted in error messages.
const EXCERPT_CHARS: usize = 13;

/// A lazy token stream over one source text.
///
/// Yields `Ok` tokens ending with a single [`TokenKind::Eof`], or stops
/// after the first `Err`. The stream cannot be restarted; create a new
/// lexer instead.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    location: Location,
    state: State,
    content_model: ContentModel,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`. `start` gives the filename and the
    /// position of the first character.
    #[must_use]
    pub fn new(input: &'a str, start: Location) -> Self {
        Self {
            input,
            pos: 0,
            location: start.with_size(0),
            state: State::Initial,
            content_model: ContentModel::Text,
            finished: false,
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    fn rules(&self) -> &'static [Rule] {
        match self.state {
            State::Initial => INITIAL,
            State::Doctype => DOCTYPE,
            State::Text => TEXT,
            State::Tag => TAG,
            State::Attr => ATTR,
            State::Cdata => CDATA,
            State::Script => SCRIPT,
        }
    }

    fn expected(&self) -> &'static str {
        match self.state {
            State::Initial => "expected doctype",
            State::Doctype => "expected doctype name",
            State::Text => "expected text or \"<\"",
            State::Tag | State::Attr => "expected attribute, \">\" or \"/>\"",
            State::Cdata => "expected ]]>",
            State::Script => "expected </script>",
        }
    }

    /// Run one step of the current state: the first matching rule may emit a
    /// token and decides the next state.
    fn step(&mut self) -> Result<Option<Token<'a>>, InvalidTokenError> {
        let rest: &'a str = &self.input[self.pos..];
        for &(matcher, next, kind) in self.rules() {
            let data: Captures<'a> = match matcher {
                Some(matcher) => match matcher(rest) {
                    Some(data) => data,
                    None => continue,
                },
                None => Vec::new(),
            };
            let consumed = data.first().map_or(0, |text| text.len());
            let state = match next {
                Next::To(state) => state,
                Next::AfterTag => self.after_tag(&data),
            };
            self.enter(state, &data);
            let token = kind.map(|kind| Token {
                kind,
                location: self.location.with_size(consumed),
                data,
            });
            self.location.advance(&rest[..consumed]);
            self.pos += consumed;
            self.state = state;
            return Ok(token);
        }
        Err(self.error(self.expected()))
    }

    fn after_tag(&self, data: &[&str]) -> State {
        match self.content_model {
            ContentModel::Text => State::Text,
            // `<script/>` has no body.
            ContentModel::Script if data.first().is_some_and(|close| close.starts_with('/')) => State::Text,
            ContentModel::Script => State::Script,
        }
    }

    fn enter(&mut self, state: State, data: &[&str]) {
        if state != State::Tag {
            return;
        }
        if let Some(open) = data.first().filter(|open| open.starts_with('<')) {
            self.content_model = if *open == "<script" {
                ContentModel::Script
            } else {
                ContentModel::Text
            };
        }
    }

    fn error(&self, reason: &str) -> InvalidTokenError {
        let rest = &self.input[self.pos..];
        let line = rest.split(['\r', '\n']).next().unwrap_or_default();
        let excerpt = if line.chars().count() > EXCERPT_CHARS {
            format!("{}...", line.chars().take(EXCERPT_CHARS).collect::<String>())
        } else {
            line.to_string()
        };
        InvalidTokenError {
            location: self.location.clone(),
            message: format!("failed to tokenize {excerpt:?}, {reason}."),
        }
    }

    fn eof(&self) -> Token<'a> {
        Token {
            kind: TokenKind::Eof,
            location: self.location.with_size(0),
            data: vec![""],
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, InvalidTokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.pos >= self.input.len() {
                self.finished = true;
                return Some(Ok(self.eof()));
            }
            let (state, pos) = (self.state, self.pos);
            let result = self.step();
            if result.is_ok() && self.state == state && self.pos == pos {
                self.finished = true;
                let reason = format!("state {state} failed to consume data or change state");
                return Some(Err(self.error(&reason)));
            }
            match result {
                Ok(Some(token)) => {
                    tracing::trace!(target: "markcheck::lexer", kind = %token.kind, location = %token.location);
                    return Some(Ok(token));
                }
                Ok(None) => {}
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}
