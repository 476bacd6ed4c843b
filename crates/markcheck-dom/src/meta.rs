//! Shape of the per-tag metadata record.
//!
//! A catalog maps tag names to [`MetaElement`] records. Records are
//! deserialized from JSON; malformed permitted-content rules, unknown
//! content categories and invalid selectors are rejected while loading so
//! that validation never has to deal with them.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::selector::Selector;

/// A content-category flag: either a constant or an expression evaluated
/// against the element once the tree is complete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetaFlag {
    /// A fixed value.
    Static(bool),
    /// A computed value, resolved by the metadata table.
    Expression(PropertyExpression),
}

impl Default for MetaFlag {
    fn default() -> Self {
        Self::Static(false)
    }
}

impl MetaFlag {
    /// The flag value. Unresolved expressions count as unset.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Static(true))
    }
}

/// A computed property: a function name with an optional argument.
///
/// `"isDescendant"` alone or `["isDescendant", "a"]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyExpression {
    /// A bare function name.
    Name(String),
    /// A function name and its argument.
    Call(String, serde_json::Value),
}

impl PropertyExpression {
    /// The function name.
    #[must_use]
    pub fn function(&self) -> &str {
        match self {
            Self::Name(name) | Self::Call(name, _) => name,
        }
    }

    /// The function argument, if any.
    #[must_use]
    pub const fn argument(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Name(_) => None,
            Self::Call(_, argument) => Some(argument),
        }
    }
}

/// Deprecation information for an element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Deprecated {
    /// `true` or `false`.
    Flag(bool),
    /// A message explaining what to use instead.
    Message(String),
    /// Structured deprecation details.
    Details {
        /// What to use instead.
        #[serde(default)]
        message: Option<String>,
        /// Further documentation.
        #[serde(default)]
        documentation: Option<String>,
        /// The standard that deprecated the element.
        #[serde(default)]
        source: Option<String>,
    },
}

/// A content category referenced by `@name` in permitted-content rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ContentCategory {
    /// `@meta`: metadata content.
    #[strum(serialize = "@meta")]
    Meta,
    /// `@flow`: flow content.
    #[strum(serialize = "@flow")]
    Flow,
    /// `@sectioning`: sectioning content.
    #[strum(serialize = "@sectioning")]
    Sectioning,
    /// `@heading`: heading content.
    #[strum(serialize = "@heading")]
    Heading,
    /// `@phrasing`: phrasing content.
    #[strum(serialize = "@phrasing")]
    Phrasing,
    /// `@embedded`: embedded content.
    #[strum(serialize = "@embedded")]
    Embedded,
    /// `@interactive`: interactive content.
    #[strum(serialize = "@interactive")]
    Interactive,
    /// `@script`: script-supporting elements.
    #[strum(serialize = "@script")]
    Script,
    /// `@form`: form-associated elements.
    #[strum(serialize = "@form")]
    Form,
}

/// A single token in a permitted-content or permitted-order list.
///
/// Either a content category (`@flow`) or a tag name with an optional
/// quantity qualifier: `li` (unlimited), `li*` (unlimited), `li?` (at most one).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum PermittedToken {
    /// A content category.
    Category(ContentCategory),
    /// A tag name.
    Tag {
        /// Tag name without the qualifier.
        name: String,
        /// Maximum number of occurrences among siblings, if limited.
        limit: Option<usize>,
    },
}

impl TryFrom<String> for PermittedToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.starts_with('@') {
            return value
                .parse::<ContentCategory>()
                .map(Self::Category)
                .map_err(|_| format!("Invalid content category \"{value}\""));
        }
        let (name, limit) = if let Some(name) = value.strip_suffix('?') {
            (name, Some(1))
        } else if let Some(name) = value.strip_suffix('*') {
            (name, None)
        } else {
            (value.as_str(), None)
        };
        if name.is_empty() {
            return Err(format!("Invalid permitted content token \"{value}\""));
        }
        Ok(Self::Tag {
            name: name.to_string(),
            limit,
        })
    }
}

impl fmt::Display for PermittedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(category) => category.fmt(f),
            Self::Tag { name, limit: None } => f.write_str(name),
            Self::Tag { name, limit: Some(_) } => write!(f, "{name}?"),
        }
    }
}

/// One or many entries, as accepted by `{"exclude": ...}`.
///
/// A list excludes every entry in it; a nested list inside it is an
/// all-of group like anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExcludeList {
    /// Several entries.
    Many(Vec<PermittedEntry>),
    /// A single entry.
    One(Box<PermittedEntry>),
}

impl ExcludeList {
    /// The entries as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[PermittedEntry] {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => std::slice::from_ref(entry.as_ref()),
        }
    }
}

/// A negated group: the node must match none of the listed entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermittedGroup {
    /// Entries the node must not match.
    pub exclude: ExcludeList,
}

/// An entry in a permitted-content list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PermittedEntry {
    /// A category or tag name.
    Token(PermittedToken),
    /// Every token in the group must hold.
    AllOf(Vec<PermittedEntry>),
    /// None of the entries may hold.
    Exclude(PermittedGroup),
}

/// An allowed attribute value: a literal or a regular expression written as
/// `/pattern/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub enum AttributePattern {
    /// The value must equal this string.
    Literal(String),
    /// The value must match this expression.
    Regex(Regex),
}

impl AttributePattern {
    /// Test a static value against the pattern.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == value,
            Self::Regex(regex) => regex.is_match(value),
        }
    }

    /// Whether this is the empty literal, which permits empty values.
    #[must_use]
    pub fn is_empty_literal(&self) -> bool {
        matches!(self, Self::Literal(literal) if literal.is_empty())
    }
}

impl TryFrom<String> for AttributePattern {
    type Error = regex::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.strip_prefix('/').and_then(|v| v.strip_suffix('/')) {
            Some(pattern) if value.len() >= 2 => Regex::new(pattern).map(Self::Regex),
            _ => Ok(Self::Literal(value)),
        }
    }
}

impl PartialEq for AttributePattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => f.write_str(literal),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Properties usable with reverse lookups ("every tag that is void").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum MetaLookupableProperty {
    /// Metadata content.
    Metadata,
    /// Flow content.
    Flow,
    /// Sectioning content.
    Sectioning,
    /// Heading content.
    Heading,
    /// Phrasing content.
    Phrasing,
    /// Embedded content.
    Embedded,
    /// Interactive content.
    Interactive,
    /// Deprecated element.
    Deprecated,
    /// Foreign element (subtree is not parsed).
    Foreign,
    /// Void element.
    Void,
    /// Transparent content model.
    Transparent,
    /// Script-supporting element.
    ScriptSupporting,
    /// Form-associated element.
    Form,
}

/// Facts about one tag name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MetaElement {
    /// The tag this record describes. Filled in by the catalog.
    #[serde(skip)]
    pub tag_name: String,
    /// Tag whose record this one extends.
    pub inherit: Option<String>,
    /// Metadata content category.
    pub metadata: MetaFlag,
    /// Flow content category.
    pub flow: MetaFlag,
    /// Sectioning content category.
    pub sectioning: MetaFlag,
    /// Heading content category.
    pub heading: MetaFlag,
    /// Phrasing content category.
    pub phrasing: MetaFlag,
    /// Embedded content category.
    pub embedded: MetaFlag,
    /// Interactive content category.
    pub interactive: MetaFlag,
    /// Deprecation status.
    pub deprecated: Option<Deprecated>,
    /// Foreign element: its body is skipped by the parser.
    pub foreign: bool,
    /// Void element: never has an end tag.
    pub void: bool,
    /// Transparent content model.
    pub transparent: bool,
    /// Tags whose start implicitly closes this element.
    pub implicit_closed: Vec<String>,
    /// Script-supporting element.
    pub script_supporting: bool,
    /// Form-associated element.
    pub form: bool,
    /// Attributes that are deprecated on this element.
    pub deprecated_attributes: Vec<String>,
    /// Attributes that must be present.
    pub required_attributes: Vec<String>,
    /// Allowed values per attribute. An empty list marks a boolean attribute.
    pub attributes: BTreeMap<String, Vec<AttributePattern>>,
    /// Rules for direct children.
    pub permitted_content: Option<Vec<PermittedEntry>>,
    /// Rules for all descendants.
    pub permitted_descendants: Option<Vec<PermittedEntry>>,
    /// Required order of children.
    pub permitted_order: Option<Vec<PermittedToken>>,
    /// At least one of these selectors must match an ancestor.
    pub required_ancestors: Option<Vec<Selector>>,
    /// Tags that must be present among the children.
    pub required_content: Option<Vec<String>>,
}

impl MetaElement {
    /// Whether the element belongs to `category`.
    #[must_use]
    pub const fn in_category(&self, category: ContentCategory) -> bool {
        match category {
            ContentCategory::Meta => self.metadata.is_set(),
            ContentCategory::Flow => self.flow.is_set(),
            ContentCategory::Sectioning => self.sectioning.is_set(),
            ContentCategory::Heading => self.heading.is_set(),
            ContentCategory::Phrasing => self.phrasing.is_set(),
            ContentCategory::Embedded => self.embedded.is_set(),
            ContentCategory::Interactive => self.interactive.is_set(),
            ContentCategory::Script => self.script_supporting,
            ContentCategory::Form => self.form,
        }
    }

    /// Whether a lookupable property is set.
    #[must_use]
    pub fn has_property(&self, property: MetaLookupableProperty) -> bool {
        match property {
            MetaLookupableProperty::Metadata => self.metadata.is_set(),
            MetaLookupableProperty::Flow => self.flow.is_set(),
            MetaLookupableProperty::Sectioning => self.sectioning.is_set(),
            MetaLookupableProperty::Heading => self.heading.is_set(),
            MetaLookupableProperty::Phrasing => self.phrasing.is_set(),
            MetaLookupableProperty::Embedded => self.embedded.is_set(),
            MetaLookupableProperty::Interactive => self.interactive.is_set(),
            MetaLookupableProperty::Deprecated => {
                !matches!(self.deprecated, None | Some(Deprecated::Flag(false)))
            }
            MetaLookupableProperty::Foreign => self.foreign,
            MetaLookupableProperty::Void => self.void,
            MetaLookupableProperty::Transparent => self.transparent,
            MetaLookupableProperty::ScriptSupporting => self.script_supporting,
            MetaLookupableProperty::Form => self.form,
        }
    }

    /// The category flags, keyed by their catalog name.
    #[must_use]
    pub const fn flags(&self) -> [(&'static str, &MetaFlag); 7] {
        [
            ("metadata", &self.metadata),
            ("flow", &self.flow),
            ("sectioning", &self.sectioning),
            ("heading", &self.heading),
            ("phrasing", &self.phrasing),
            ("embedded", &self.embedded),
            ("interactive", &self.interactive),
        ]
    }

    /// Mutable access to the category flags, keyed by their catalog name.
    pub fn flags_mut(&mut self) -> [(&'static str, &mut MetaFlag); 7] {
        [
            ("metadata", &mut self.metadata),
            ("flow", &mut self.flow),
            ("sectioning", &mut self.sectioning),
            ("heading", &mut self.heading),
            ("phrasing", &mut self.phrasing),
            ("embedded", &mut self.embedded),
            ("interactive", &mut self.interactive),
        ]
    }
}
