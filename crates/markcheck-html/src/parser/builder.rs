//! Tree construction.
//!
//! [`Parser`] owns the event bus and the metadata table and can parse any
//! number of sources; each call to [`Parser::parse_html`] runs a fresh
//! [`TreeBuilder`] over a fresh lexer and tree.
//!
//! Events for an element are emitted in this order: `tag:open`, one `attr`
//! per logical attribute, then (once its end is known) `tag:close` followed
//! by `element:ready`.

use std::rc::Rc;

use markcheck_common::{EventHandler, ListenerHandle, Location};
use markcheck_dom::{DomTree, DynamicValue, NodeClosed, NodeId, Value};
use markcheck_meta::MetaTable;

use super::conditional::parse_conditional_comment;
use super::error::{ParseError, ParserError};
use super::event::ParserEvent;
use super::source::{AttributeData, Source};
use crate::tokenizer::{Lexer, Token, TokenKind};

/// The event bus type shared by the parser and the rules.
pub type ParserEvents = EventHandler<ParserEvent, DomTree>;

/// Parses HTML sources into trees, emitting events as it goes.
#[derive(Clone)]
pub struct Parser {
    events: ParserEvents,
    meta: Rc<MetaTable>,
}

impl Parser {
    /// Create a parser using `meta` for element metadata.
    #[must_use]
    pub fn new(meta: Rc<MetaTable>) -> Self {
        Self {
            events: EventHandler::new(),
            meta,
        }
    }

    /// The event bus.
    #[must_use]
    pub const fn events(&self) -> &ParserEvents {
        &self.events
    }

    /// The metadata table.
    #[must_use]
    pub const fn meta(&self) -> &Rc<MetaTable> {
        &self.meta
    }

    /// Listen to one or more comma-separated event names (`"*"` for all).
    pub fn on<F>(&self, names: &str, listener: F) -> ListenerHandle<ParserEvent, DomTree>
    where
        F: Fn(&ParserEvent, &DomTree) + 'static,
    {
        self.events.on(names, listener)
    }

    /// Listen to the first of the named events only.
    pub fn once<F>(&self, names: &str, listener: F) -> ListenerHandle<ParserEvent, DomTree>
    where
        F: Fn(&ParserEvent, &DomTree) + 'static,
    {
        self.events.once(names, listener)
    }

    /// Run `callback` after the next event has been fully dispatched.
    pub fn defer<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        let _ = self.events.defer(callback);
    }

    /// Deliver an event to listeners.
    pub fn trigger(&self, event: &ParserEvent, tree: &DomTree) {
        self.events.trigger(event, tree);
    }

    /// Parse a source into a tree.
    ///
    /// Emits `dom:load` first and, when the whole document was consumed,
    /// `dom:ready` last.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Token`] when the lexer fails,
    /// [`ParseError::Stream`] when the input ends inside a construct and
    /// [`ParseError::Directive`] for a malformed directive comment. Events
    /// emitted before the failure are not retracted.
    pub fn parse_html(&self, source: &Source) -> Result<DomTree, ParseError> {
        TreeBuilder::new(self, source).run()
    }
}

/// State for one parse.
struct TreeBuilder<'p, 'a> {
    parser: &'p Parser,
    source: &'a Source,
    tokens: Lexer<'a>,
    tree: DomTree,
}

impl<'p, 'a> TreeBuilder<'p, 'a> {
    fn new(parser: &'p Parser, source: &'a Source) -> Self {
        let start = source.start_location();
        Self {
            parser,
            source,
            tokens: Lexer::new(&source.data, start.clone()),
            tree: DomTree::new(start),
        }
    }

    fn trigger(&self, event: &ParserEvent) {
        self.parser.trigger(event, &self.tree);
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        self.tokens.next().transpose().map_err(ParseError::from)
    }

    fn run(mut self) -> Result<DomTree, ParseError> {
        tracing::debug!(target: "markcheck::parser", filename = %self.source.filename, "parsing");
        self.trigger(&ParserEvent::DomLoad { location: None });

        while let Some(token) = self.next_token()? {
            match token.kind {
                TokenKind::TagOpen => self.consume_tag(&token)?,
                TokenKind::Whitespace => {
                    self.trigger(&ParserEvent::Whitespace {
                        text: token.text().to_string(),
                        location: token.location.clone(),
                    });
                    self.append_text(Value::from(token.text()), token.location);
                }
                TokenKind::Text | TokenKind::Templating => {
                    self.trigger(&ParserEvent::Text {
                        text: token.text().to_string(),
                        location: token.location.clone(),
                    });
                    let value = if token.kind == TokenKind::Templating {
                        Value::Dynamic(DynamicValue::new(token.text()))
                    } else {
                        Value::from(token.text())
                    };
                    self.append_text(value, token.location);
                }
                TokenKind::Directive => self.consume_directive(&token)?,
                TokenKind::Conditional => self.trigger(&ParserEvent::Conditional {
                    condition: token.capture(1).unwrap_or_default().to_string(),
                    location: token.location.clone(),
                }),
                TokenKind::Comment => self.consume_comment(&token),
                TokenKind::DoctypeOpen => self.consume_doctype(&token)?,
                TokenKind::Eof => self.close_tree(&token.location),
                _ => {}
            }
        }

        self.parser.meta.resolve_all(&mut self.tree);
        self.trigger(&ParserEvent::DomReady { location: None });
        Ok(self.tree)
    }

    fn append_text(&mut self, text: Value, location: Location) {
        let active = self.tree.active();
        let _ = self.tree.append_text(active, text, location);
    }

    /// Collect tokens up to and including the next token of kind `search`.
    fn consume_until(&mut self, search: TokenKind, error_location: &Location) -> Result<Vec<Token<'a>>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            let found = token.kind == search;
            tokens.push(token);
            if found {
                return Ok(tokens);
            }
        }
        Err(ParserError {
            location: error_location.clone(),
            message: format!("stream ended before {search} token was found"),
        }
        .into())
    }

    /// Whether the active element has an optional end tag that this tag ends.
    fn close_optional(&self, open: bool, tag_name: &str) -> bool {
        let active = self.tree.active();
        let Some(meta) = self.tree.as_element(active).and_then(|el| el.meta.as_ref()) else {
            return false;
        };
        let closes = |name: &str| meta.implicit_closed.iter().any(|tag| tag.eq_ignore_ascii_case(name));
        if open {
            return closes(tag_name);
        }
        if self.tree.is(active, tag_name) {
            return false;
        }
        let parent_closed = self
            .tree
            .parent(active)
            .is_some_and(|parent| self.tree.is(parent, tag_name));
        parent_closed && self.tree.tag_name(active).is_some_and(closes)
    }

    fn consume_tag(&mut self, start: &Token<'a>) -> Result<(), ParseError> {
        let tokens = self.consume_until(TokenKind::TagClose, &start.location)?;
        let (end_location, self_closed) = tokens
            .last()
            .map_or((start.location.clone(), false), |end| (end.location.clone(), end.text() == "/>"));

        let open = start.capture(1) != Some("/");
        let tag_name = start.capture(2).unwrap_or_default();
        let close_optional = self.close_optional(open, tag_name);
        let active = self.tree.active();
        let parent = if close_optional {
            self.tree.parent(active).unwrap_or(NodeId::ROOT)
        } else {
            active
        };

        let meta = self.parser.meta.get_meta_for(tag_name);
        let void = meta.as_ref().is_some_and(|meta| meta.void);
        let foreign = meta.as_ref().is_some_and(|meta| meta.foreign);
        let closed = if !open {
            NodeClosed::EndTag
        } else if self_closed {
            NodeClosed::VoidSelfClosed
        } else if void {
            NodeClosed::VoidOmitted
        } else {
            NodeClosed::Open
        };
        let location = start.location.slice(start.text(), 1, None);
        let node = self
            .tree
            .create_element(tag_name, closed, meta, open.then_some(parent), location);
        let close = !open || closed != NodeClosed::Open;

        if close_optional {
            if let Some(element) = self.tree.as_element_mut(active) {
                element.closed = NodeClosed::ImplicitClosed;
            }
            self.close_element(Some(node), active, &start.location);
            self.tree.pop_active();
        }

        if open {
            self.tree.push_active(node);
            self.trigger(&ParserEvent::TagOpen {
                target: node,
                location: start.location.clone(),
            });
        }

        for (index, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::AttrName {
                self.consume_attribute(node, token, tokens.get(index + 1));
            }
        }

        if close {
            let active = self.tree.active();
            self.close_element(Some(node), active, &end_location);
            // `</br>` after a void `<br>`: the void element was already popped.
            if open || !void {
                self.tree.pop_active();
            }
        } else if foreign {
            self.discard_foreign_body(tag_name, &start.location)?;
        }
        Ok(())
    }

    /// Run the element hook, then emit `tag:close` and `element:ready`.
    fn close_element(&mut self, node: Option<NodeId>, active: NodeId, location: &Location) {
        if let Some(process_element) = &self.source.hooks.process_element {
            process_element(&mut self.tree, active, self.parser.meta.as_ref());
        }
        self.trigger(&ParserEvent::TagClose {
            target: node,
            previous: active,
            location: location.clone(),
        });
        if !self.tree.is_root(active) {
            self.trigger(&ParserEvent::ElementReady {
                target: active,
                location: self.tree.location(active).clone(),
            });
        }
    }

    /// Skip everything up to the end tag matching a foreign element, counting
    /// nested elements of the same name.
    fn discard_foreign_body(&mut self, tag_name: &str, error_location: &Location) -> Result<(), ParseError> {
        let mut nested = 1_usize;
        let mut closing: Option<(Location, Location)> = None;
        while nested > 0 {
            let tokens = self.consume_until(TokenKind::TagOpen, error_location)?;
            let Some(last) = tokens.last() else {
                continue;
            };
            if last.capture(2) != Some(tag_name) {
                continue;
            }
            let end_tokens = self.consume_until(TokenKind::TagClose, &last.location)?;
            let Some(end) = end_tokens.last() else {
                continue;
            };
            if last.capture(1) == Some("/") {
                closing = Some((last.location.slice(last.text(), 1, None), end.location.clone()));
                nested -= 1;
            } else if end.text() != "/>" {
                nested += 1;
            }
        }

        let Some((location, end_location)) = closing else {
            return Ok(());
        };
        let meta = self.parser.meta.get_meta_for(tag_name);
        let node = self
            .tree
            .create_element(tag_name, NodeClosed::EndTag, meta, None, location);
        let active = self.tree.active();
        self.close_element(Some(node), active, &end_location);
        self.tree.pop_active();
        Ok(())
    }

    fn consume_attribute(&mut self, node: NodeId, token: &Token<'a>, next: Option<&Token<'a>>) {
        let key_location = token.location.clone();
        let value_token = next.filter(|next| next.kind == TokenKind::AttrValue);
        let value_location = value_token.and_then(attribute_value_location);
        let data = AttributeData {
            key: token.capture(1).unwrap_or_else(|| token.text()).to_string(),
            value: value_token.and_then(|t| t.capture(1)).map(Value::from),
            quote: value_token.and_then(|t| t.capture(2)).and_then(|q| q.chars().next()),
            original_attribute: None,
        };
        let attributes = match &self.source.hooks.process_attribute {
            Some(process_attribute) => process_attribute(data),
            None => vec![data],
        };

        for attr in attributes {
            self.trigger(&ParserEvent::Attr {
                target: node,
                key: attr.key.clone(),
                value: attr.value.clone(),
                quote: attr.quote,
                original_attribute: attr.original_attribute.clone(),
                location: key_location.clone(),
                value_location: value_location.clone(),
            });
            if let Some(element) = self.tree.as_element_mut(node) {
                element.set_attribute(
                    &attr.key,
                    attr.value,
                    key_location.clone(),
                    value_location.clone(),
                    attr.original_attribute,
                );
            }
        }
    }

    fn consume_directive(&self, token: &Token<'a>) -> Result<(), ParseError> {
        let body = token.capture(1).unwrap_or_default();
        let Some((action, data, comment)) = split_directive(body) else {
            return Err(ParseError::Directive {
                directive: body.to_string(),
                location: token.location.clone(),
            });
        };
        self.trigger(&ParserEvent::Directive {
            action: action.to_string(),
            data: data.to_string(),
            comment: comment.to_string(),
            location: token.location.clone(),
        });
        Ok(())
    }

    fn consume_comment(&self, token: &Token<'a>) {
        for conditional in parse_conditional_comment(token.text(), &token.location) {
            self.trigger(&ParserEvent::Conditional {
                condition: conditional.expression,
                location: conditional.location,
            });
        }
    }

    fn consume_doctype(&mut self, start: &Token<'a>) -> Result<(), ParseError> {
        let tokens = self.consume_until(TokenKind::DoctypeClose, &start.location)?;
        let (value, value_location) = tokens
            .iter()
            .find(|token| token.kind == TokenKind::DoctypeValue)
            .map_or(("", start.location.clone()), |token| (token.text(), token.location.clone()));
        self.tree.set_doctype(value);
        self.trigger(&ParserEvent::Doctype {
            value: value.to_string(),
            value_location,
            location: start.location.clone(),
        });
        Ok(())
    }

    /// Close every element still open, innermost first.
    fn close_tree(&mut self, location: &Location) {
        loop {
            let active = self.tree.active();
            if self.tree.is_root(active) {
                break;
            }
            self.close_element(None, active, location);
            self.tree.pop_active();
        }
    }
}

/// The location of just the value inside an attribute value token; `None`
/// for empty values.
///
/// ```text
/// foo="bar"    foo='bar'    foo=bar    foo=""
///      ^^^          ^^^         ^^^    (none)
/// ```
fn attribute_value_location(token: &Token<'_>) -> Option<Location> {
    let value = token.capture(1).filter(|value| !value.is_empty())?;
    let whole = token.text();
    let end = if token.capture(2).is_some() {
        whole.len() - 1
    } else {
        whole.len()
    };
    Some(token.location.slice(whole, end - value.len(), Some(end)))
}

/// Split `action data : comment`.
///
/// The action is one or more ASCII alphanumerics or `-`; the comment is
/// everything after the first `:`.
fn split_directive(body: &str) -> Option<(&str, &str, &str)> {
    let action_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
        .count();
    if action_len == 0 {
        return None;
    }
    let action = &body[..action_len];
    let rest = body[action_len..].trim_start();
    Some(match rest.split_once(':') {
        Some((data, comment)) => (action, data.trim_end(), comment.trim_start()),
        None => (action, rest, ""),
    })
}
