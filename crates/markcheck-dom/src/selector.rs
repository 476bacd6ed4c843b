//! Selector parsing and matching.
//!
//! Supports a subset of CSS selectors:
//!
//! - type selectors (`div`, `*`)
//! - `.class`, `#id`
//! - attribute selectors `[attr]`, `[attr=v]`, `[attr~=v]`, `[attr^=v]`,
//!   `[attr$=v]`, `[attr*=v]`, `[attr|=v]`
//! - pseudo-classes `:first-child`, `:last-child`, `:nth-child(n)`, `:scope`
//! - combinators: descendant (whitespace), `>`, `+`, `~`
//! - selector lists separated by `,`
//!
//! A selector is a chain of [`Pattern`]s. Matching walks the chain
//! depth-first: the candidates for a pattern are found relative to the node
//! matched by the previous one (or the query root for the first pattern), and
//! a candidate that passes every qualifier becomes the root for the next
//! pattern. Candidates that complete the chain are yielded lazily by
//! [`SelectorMatches`].

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::{DomTree, ElementData, NodeId};

/// Errors raised while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector is syntactically malformed.
    #[error("Failed to parse selector \"{selector}\": {reason}")]
    Syntax {
        /// The selector text.
        selector: String,
        /// What went wrong.
        reason: String,
    },
    /// An attribute selector uses an operator the engine cannot evaluate.
    #[error("Attribute selector operator \"{0}\" is not implemented")]
    UnknownOperator(String),
    /// A pseudo-class the engine cannot evaluate.
    #[error("Pseudo-class \":{0}\" is not implemented")]
    UnknownPseudoClass(String),
    /// A pseudo-class argument is invalid.
    #[error("Invalid argument \"{argument}\" for pseudo-class \":{name}\"")]
    InvalidArgument {
        /// The pseudo-class name.
        name: String,
        /// The offending argument.
        argument: String,
    },
}

/// How a pattern relates to the node matched by the previous pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any descendant.
    Descendant,
    /// `>`: a direct child.
    Child,
    /// `+`: the next element sibling.
    AdjacentSibling,
    /// `~`: any following element sibling.
    GeneralSibling,
}

impl Combinator {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::Child),
            '+' => Some(Self::AdjacentSibling),
            '~' => Some(Self::GeneralSibling),
            _ => None,
        }
    }
}

/// Attribute selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`: the attribute is present.
    Exists(String),
    /// `[attr=value]`: the value is exactly `value`.
    Equals(String, String),
    /// `[attr~=value]`: one of the whitespace-separated words is `value`.
    Includes(String, String),
    /// `[attr|=value]`: the value is `value` or starts with `value-`.
    DashMatch(String, String),
    /// `[attr^=value]`: the value starts with `value`.
    PrefixMatch(String, String),
    /// `[attr$=value]`: the value ends with `value`.
    SuffixMatch(String, String),
    /// `[attr*=value]`: the value contains `value`.
    SubstringMatch(String, String),
}

impl AttributeSelector {
    fn key(&self) -> &str {
        match self {
            Self::Exists(key)
            | Self::Equals(key, _)
            | Self::Includes(key, _)
            | Self::DashMatch(key, _)
            | Self::PrefixMatch(key, _)
            | Self::SuffixMatch(key, _)
            | Self::SubstringMatch(key, _) => key,
        }
    }

    fn value_matches(&self, actual: &str) -> bool {
        match self {
            Self::Exists(_) => true,
            Self::Equals(_, v) => actual == v,
            Self::Includes(_, v) => actual.split_whitespace().any(|word| word == v),
            Self::DashMatch(_, v) => {
                actual == v || actual.strip_prefix(v.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }
            Self::PrefixMatch(_, v) => !v.is_empty() && actual.starts_with(v.as_str()),
            Self::SuffixMatch(_, v) => !v.is_empty() && actual.ends_with(v.as_str()),
            Self::SubstringMatch(_, v) => !v.is_empty() && actual.contains(v.as_str()),
        }
    }

    /// Any attribute with the key passes; boolean attributes only satisfy
    /// `Exists` and dynamic values satisfy every operator.
    fn matches(&self, element: &ElementData) -> bool {
        element.get_attribute_all(self.key()).any(|attr| {
            if matches!(self, Self::Exists(_)) {
                return true;
            }
            attr.value
                .as_ref()
                .is_some_and(|value| value.as_static().is_none_or(|v| self.value_matches(v)))
        })
    }
}

/// Structural pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:first-child`: first element among its siblings.
    FirstChild,
    /// `:last-child`: last element among its siblings.
    LastChild,
    /// `:nth-child(n)`: the n-th (1-based) element among its siblings.
    NthChild(usize),
    /// `:scope`: the node the query started from.
    Scope,
}

impl PseudoClass {
    fn parse(name: &str, argument: Option<&str>) -> Result<Self, SelectorError> {
        match (name, argument) {
            ("first-child", None) => Ok(Self::FirstChild),
            ("last-child", None) => Ok(Self::LastChild),
            ("scope", None) => Ok(Self::Scope),
            ("nth-child", Some(argument)) => argument
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .map(Self::NthChild)
                .ok_or_else(|| SelectorError::InvalidArgument {
                    name: name.to_string(),
                    argument: argument.to_string(),
                }),
            ("first-child" | "last-child" | "scope", Some(argument)) => Err(SelectorError::InvalidArgument {
                name: name.to_string(),
                argument: argument.to_string(),
            }),
            ("nth-child", None) => Err(SelectorError::InvalidArgument {
                name: name.to_string(),
                argument: String::new(),
            }),
            _ => Err(SelectorError::UnknownPseudoClass(name.to_string())),
        }
    }

    fn matches(&self, tree: &DomTree, node: NodeId, scope: NodeId) -> bool {
        match self {
            Self::FirstChild => tree.siblings(node).first() == Some(&node),
            Self::LastChild => tree.siblings(node).last() == Some(&node),
            Self::NthChild(n) => tree.siblings(node).get(n - 1) == Some(&node),
            Self::Scope => node == scope,
        }
    }
}

/// A condition attached to a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// `.name`
    Class(String),
    /// `#name`
    Id(String),
    /// `[...]`
    Attribute(AttributeSelector),
    /// `:name` or `:name(arg)`
    PseudoClass(PseudoClass),
}

impl Qualifier {
    fn matches(&self, tree: &DomTree, node: NodeId, element: &ElementData, scope: NodeId) -> bool {
        match self {
            Self::Class(name) => element.class_list().contains(name),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Attribute(selector) => selector.matches(element),
            Self::PseudoClass(pseudo) => pseudo.matches(tree, node, scope),
        }
    }
}

/// One step of a selector chain: combinator, tag test and qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Relation to the node matched by the previous pattern.
    pub combinator: Combinator,
    /// Required tag name; `None` matches any element.
    pub tag_name: Option<String>,
    /// Additional conditions.
    pub qualifiers: Vec<Qualifier>,
}

impl Pattern {
    fn parse(text: &str, combinator: Combinator, selector: &str) -> Result<Self, SelectorError> {
        let syntax = |reason: &str| SelectorError::Syntax {
            selector: selector.to_string(),
            reason: reason.to_string(),
        };

        let tag_end = text.find(['.', '#', '[', ':']).unwrap_or(text.len());
        let tag_name = match &text[..tag_end] {
            "" | "*" => None,
            tag => Some(tag.to_string()),
        };

        let mut qualifiers = Vec::new();
        let mut rest = &text[tag_end..];
        while let Some(marker) = rest.chars().next() {
            rest = &rest[marker.len_utf8()..];
            match marker {
                '.' | '#' => {
                    let end = rest.find(['.', '#', '[', ':']).unwrap_or(rest.len());
                    let name = &rest[..end];
                    if name.is_empty() {
                        return Err(syntax("expected a name after \".\" or \"#\""));
                    }
                    qualifiers.push(if marker == '.' {
                        Qualifier::Class(name.to_string())
                    } else {
                        Qualifier::Id(name.to_string())
                    });
                    rest = &rest[end..];
                }
                '[' => {
                    let end = closing_index(rest, ']').ok_or_else(|| syntax("unterminated \"[\""))?;
                    qualifiers.push(Qualifier::Attribute(parse_attribute(&rest[..end], selector)?));
                    rest = &rest[end + 1..];
                }
                ':' => {
                    let end = rest.find(['.', '#', '[', ':', '(']).unwrap_or(rest.len());
                    let name = &rest[..end];
                    rest = &rest[end..];
                    let argument = if let Some(inner) = rest.strip_prefix('(') {
                        let close = closing_index(inner, ')').ok_or_else(|| syntax("unterminated \"(\""))?;
                        rest = &inner[close + 1..];
                        Some(&inner[..close])
                    } else {
                        None
                    };
                    qualifiers.push(Qualifier::PseudoClass(PseudoClass::parse(name, argument)?));
                }
                _ => return Err(syntax("unexpected character")),
            }
        }

        Ok(Self {
            combinator,
            tag_name,
            qualifiers,
        })
    }

    fn is_scope(&self) -> bool {
        self.tag_name.is_none() && self.qualifiers == [Qualifier::PseudoClass(PseudoClass::Scope)]
    }

    /// Whether `node` passes the tag test and every qualifier.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId, scope: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return node == scope && self.is_scope();
        };
        self.tag_name.as_deref().is_none_or(|tag| element.is(tag))
            && self
                .qualifiers
                .iter()
                .all(|qualifier| qualifier.matches(tree, node, element, scope))
    }

    /// Nodes related to `root` by this pattern's combinator whose tag fits.
    fn candidates(&self, tree: &DomTree, root: NodeId, first: bool) -> Vec<NodeId> {
        if first && self.is_scope() && self.combinator == Combinator::Descendant {
            return vec![root];
        }
        let tag = self.tag_name.as_deref().unwrap_or("*");
        match self.combinator {
            Combinator::Descendant => tree.get_elements_by_tag_name(root, tag),
            Combinator::Child => tree.child_elements(root).filter(|&c| tree.is(c, tag)).collect(),
            Combinator::AdjacentSibling => tree
                .next_sibling(root)
                .filter(|&s| tree.is(s, tag))
                .into_iter()
                .collect(),
            Combinator::GeneralSibling => tree
                .following_siblings(root)
                .into_iter()
                .filter(|&s| tree.is(s, tag))
                .collect(),
        }
    }
}

/// Index of the `close` character ending a bracketed group, skipping quoted
/// text.
fn closing_index(text: &str, close: char) -> Option<usize> {
    let mut quote = None;
    for (index, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, c) if c == close => return Some(index),
            _ => {}
        }
    }
    None
}

fn parse_attribute(inner: &str, selector: &str) -> Result<AttributeSelector, SelectorError> {
    let Some(eq) = inner.find('=') else {
        let key = inner.trim();
        if key.is_empty() {
            return Err(SelectorError::Syntax {
                selector: selector.to_string(),
                reason: "empty attribute selector".to_string(),
            });
        }
        return Ok(AttributeSelector::Exists(key.to_string()));
    };

    let (key, operator) = match inner[..eq].chars().last() {
        Some(c @ ('~' | '|' | '^' | '$' | '*')) => (&inner[..eq - 1], Some(c)),
        Some(c) if c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | ' ') => (&inner[..eq], None),
        Some(c) => return Err(SelectorError::UnknownOperator(format!("{c}="))),
        None => (&inner[..eq], None),
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(SelectorError::Syntax {
            selector: selector.to_string(),
            reason: "missing attribute name".to_string(),
        });
    }

    let raw = inner[eq + 1..].trim();
    let value = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(raw)
        .to_string();

    Ok(match operator {
        None => AttributeSelector::Equals(key, value),
        Some('~') => AttributeSelector::Includes(key, value),
        Some('|') => AttributeSelector::DashMatch(key, value),
        Some('^') => AttributeSelector::PrefixMatch(key, value),
        Some('$') => AttributeSelector::SuffixMatch(key, value),
        Some(_) => AttributeSelector::SubstringMatch(key, value),
    })
}

/// Split `text` on `separator` where it appears outside brackets, parentheses
/// and quotes.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_chain(text: &str, selector: &str) -> Result<Vec<Pattern>, SelectorError> {
    let syntax = |reason: &str| SelectorError::Syntax {
        selector: selector.to_string(),
        reason: reason.to_string(),
    };

    let mut chain = Vec::new();
    let mut combinator = Combinator::Descendant;
    let mut explicit = false;
    let mut start = None;
    let mut depth = 0usize;
    let mut quote = None;

    let mut flush = |start: &mut Option<usize>, end: usize, combinator: &mut Combinator, explicit: &mut bool| {
        if let Some(begin) = start.take() {
            chain.push(Pattern::parse(&text[begin..end], *combinator, selector)?);
            *combinator = Combinator::Descendant;
            *explicit = false;
        }
        Ok::<(), SelectorError>(())
    };

    for (index, c) in text.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_whitespace() => {
                flush(&mut start, index, &mut combinator, &mut explicit)?;
                continue;
            }
            c => {
                if let Some(next) = Combinator::from_char(c) {
                    flush(&mut start, index, &mut combinator, &mut explicit)?;
                    if explicit {
                        return Err(syntax("consecutive combinators"));
                    }
                    combinator = next;
                    explicit = true;
                    continue;
                }
            }
        }
        if start.is_none() {
            start = Some(index);
        }
    }
    flush(&mut start, text.len(), &mut combinator, &mut explicit)?;

    if explicit {
        return Err(syntax("selector ends with a combinator"));
    }
    if chain.is_empty() {
        return Err(syntax("empty selector"));
    }
    Ok(chain)
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    chains: Vec<Vec<Pattern>>,
}

impl Selector {
    /// Parse a selector (or comma-separated selector list).
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for malformed syntax, unknown attribute
    /// operators and unknown pseudo-classes.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let chains = split_top_level(source, ',')
            .into_iter()
            .map(|part| parse_chain(part.trim(), source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            chains,
        })
    }

    /// The selector text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The pattern chains, one per comma-separated selector.
    #[must_use]
    pub fn chains(&self) -> &[Vec<Pattern>] {
        &self.chains
    }

    /// Lazily yield matches below `root`, chain by chain. A node matched by
    /// several chains is yielded once per chain.
    pub fn query<'a>(&'a self, tree: &'a DomTree, root: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        self.chains
            .iter()
            .flat_map(move |chain| SelectorMatches::new(tree, root, chain))
    }

    /// Every match below `root`, without duplicates.
    #[must_use]
    pub fn query_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.query(tree, root).filter(|&node| seen.insert(node)).collect()
    }

    /// The first match below `root`.
    #[must_use]
    pub fn query_first(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        self.query(tree, root).next()
    }

    /// Whether `node` is matched when querying from the document root.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.query(tree, tree.root()).any(|candidate| candidate == node)
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl<'de> serde::Deserialize<'de> for Selector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct Frame {
    level: usize,
    candidates: std::vec::IntoIter<NodeId>,
}

/// Lazy depth-first matcher for one pattern chain.
pub struct SelectorMatches<'a> {
    tree: &'a DomTree,
    scope: NodeId,
    chain: &'a [Pattern],
    stack: Vec<Frame>,
}

impl<'a> SelectorMatches<'a> {
    /// Start matching `chain` below `root`.
    #[must_use]
    pub fn new(tree: &'a DomTree, root: NodeId, chain: &'a [Pattern]) -> Self {
        let stack = chain
            .first()
            .map(|pattern| Frame {
                level: 0,
                candidates: pattern.candidates(tree, root, true).into_iter(),
            })
            .into_iter()
            .collect();
        Self {
            tree,
            scope: root,
            chain,
            stack,
        }
    }
}

impl Iterator for SelectorMatches<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let frame = self.stack.last_mut()?;
            let level = frame.level;
            let Some(candidate) = frame.candidates.next() else {
                let _ = self.stack.pop();
                continue;
            };
            if !self.chain[level].matches(self.tree, candidate, self.scope) {
                continue;
            }
            let Some(next) = self.chain.get(level + 1) else {
                return Some(candidate);
            };
            self.stack.push(Frame {
                level: level + 1,
                candidates: next.candidates(self.tree, candidate, false).into_iter(),
            });
        }
    }
}

/// Characters that can appear in an id without escaping in a selector.
fn is_plain_identifier(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with(|c: char| c.is_ascii_digit())
        && value.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

impl DomTree {
    /// First element below `id` matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the selector cannot be parsed.
    pub fn query_selector(&self, id: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(Selector::parse(selector)?.query_first(self, id))
    }

    /// Every element below `id` matching `selector`, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the selector cannot be parsed.
    pub fn query_selector_all(&self, id: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(Selector::parse(selector)?.query_all(self, id))
    }

    /// Whether `id` matches `selector` when querying from the root.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the selector cannot be parsed.
    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, SelectorError> {
        Ok(Selector::parse(selector)?.matches(self, id))
    }

    /// The nearest node, starting with `id` itself, matching `selector`.
    #[must_use]
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&node| selector.matches(self, node))
    }

    /// Build a selector that uniquely identifies `id` in this tree.
    ///
    /// Walks from the node towards the root. An `#id` that is unique in the
    /// document ends the walk; otherwise each step is the lower-cased tag
    /// name, with `:nth-child(n)` added when siblings share the tag. If the
    /// resulting chain could also match an earlier node it is anchored with
    /// `:scope >`. Returns `None` for the root and for detached nodes.
    #[must_use]
    pub fn generate_selector(&self, id: NodeId) -> Option<String> {
        if self.is_root(id) || !self.is_element(id) {
            return None;
        }

        let mut parts = Vec::new();
        let mut current = id;
        let mut anchored_by_id = false;
        while !self.is_root(current) {
            let element = self.as_element(current)?;
            if let Some(value) = element.id().filter(|v| is_plain_identifier(v)) {
                let selector = format!("#{value}");
                if self.query_selector_all(self.root(), &selector).ok()?.len() == 1 {
                    parts.push(selector);
                    anchored_by_id = true;
                    break;
                }
            }

            let tag = element.tag_name.to_ascii_lowercase();
            let siblings = self.siblings(current);
            let same_tag = siblings.iter().filter(|&&s| self.is(s, &tag)).count();
            if same_tag == 1 {
                parts.push(tag);
            } else {
                let index = siblings.iter().position(|&s| s == current)?;
                parts.push(format!("{tag}:nth-child({})", index + 1));
            }
            current = self.parent(current)?;
        }

        parts.reverse();
        let generated = parts.join(" > ");
        if anchored_by_id || self.query_selector(self.root(), &generated).ok()? == Some(id) {
            Some(generated)
        } else {
            Some(format!(":scope > {generated}"))
        }
    }
}
