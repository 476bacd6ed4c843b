//! Element, attribute and text data carried by tree nodes.

use std::fmt;
use std::rc::Rc;

use markcheck_common::Location;
use serde::Serialize;
use strum_macros::Display;

use crate::meta::{AttributePattern, MetaElement};

/// A value that cannot be determined statically, e.g. a template
/// interpolation such as `{{ user.name }}`.
///
/// Dynamic values satisfy every pattern they are validated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicValue {
    /// The expression that produces the value at runtime.
    pub expr: String,
}

impl DynamicValue {
    /// Create a dynamic value from its source expression.
    #[must_use]
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

/// An attribute or text value: either a literal string or a dynamic marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A literal value present in the source.
    Static(String),
    /// A value only known at runtime.
    Dynamic(DynamicValue),
}

impl Value {
    /// The literal value, or `None` for dynamic values.
    #[must_use]
    pub fn as_static(&self) -> Option<&str> {
        match self {
            Self::Static(value) => Some(value),
            Self::Dynamic(_) => None,
        }
    }

    /// Whether this value is a dynamic marker.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Static(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.write_str(value),
            Self::Dynamic(value) => value.fmt(f),
        }
    }
}

/// How an element was closed.
///
/// Assigned when the element is created. The parser changes `Open` to
/// `ImplicitClosed` when it infers an omitted end tag, and marks the detached
/// node built from an explicit end tag as `EndTag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeClosed {
    /// Still open, awaiting an explicit end tag (`<div>`).
    Open,
    /// Closed by an explicit end tag (`</div>`).
    EndTag,
    /// A void element written without a slash (`<img>`).
    VoidOmitted,
    /// Written with self-closing syntax (`<img/>`).
    VoidSelfClosed,
    /// Closed by an omitted end tag (`<li>a<li>b`).
    ImplicitClosed,
}

/// An attribute on an element.
///
/// `value` is `None` for attributes written without a value (`<input disabled>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lower-cased attribute name.
    pub key: String,
    /// The attribute value, if any.
    pub value: Option<Value>,
    /// Location of the attribute name.
    pub key_location: Location,
    /// Location of the value inside its quotes, if the value is non-empty.
    pub value_location: Option<Location>,
    /// For attributes produced by a transform hook, the raw attribute they
    /// were derived from (e.g. `ng-class` for `class`).
    pub original_attribute: Option<String>,
}

impl Attribute {
    /// Create a new attribute.
    #[must_use]
    pub fn new(
        key: &str,
        value: Option<Value>,
        key_location: Location,
        value_location: Option<Location>,
        original_attribute: Option<String>,
    ) -> Self {
        Self {
            key: key.to_ascii_lowercase(),
            value,
            key_location,
            value_location,
            original_attribute,
        }
    }

    /// Whether the value is known statically (absent values count as static).
    #[must_use]
    pub fn is_static(&self) -> bool {
        !self.is_dynamic()
    }

    /// Whether the value is a dynamic marker.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_dynamic)
    }

    /// The literal value, if present and static.
    #[must_use]
    pub fn static_value(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_static)
    }

    /// Test the value against `pattern`.
    ///
    /// Attributes without a value never match. Dynamic values match when
    /// `dynamic_matches` is set.
    #[must_use]
    pub fn value_matches(&self, pattern: &AttributePattern, dynamic_matches: bool) -> bool {
        match &self.value {
            None => false,
            Some(Value::Dynamic(_)) => dynamic_matches,
            Some(Value::Static(value)) => pattern.matches(value),
        }
    }
}

/// An ordered set of whitespace-separated tokens, e.g. the value of `class`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomTokenList {
    value: String,
    tokens: Vec<String>,
}

impl DomTokenList {
    /// Split a value into tokens. Dynamic and missing values yield an empty list.
    #[must_use]
    pub fn new(value: Option<&Value>) -> Self {
        let value = value.and_then(Value::as_static).unwrap_or_default();
        Self {
            value: value.to_string(),
            tokens: value.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// The raw value the list was built from.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the list has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Whether `token` is in the list.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Iterate over the tokens in source order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

/// Element-specific data.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name as written in the source.
    pub tag_name: String,
    /// How the element was closed.
    pub closed: NodeClosed,
    /// Attributes in source order. Repeated names are preserved.
    pub attrs: Vec<Attribute>,
    /// Metadata bound to this element, if the tag is known.
    pub meta: Option<Rc<MetaElement>>,
    /// Whether the metadata marks the element as void.
    pub void_element: bool,
    /// Distance from the document root (top-level elements have depth 1).
    pub depth: usize,
    /// Human-readable name set by transformations, used in messages.
    pub annotation: Option<String>,
}

impl ElementData {
    /// Create element data. `void_element` is taken from the metadata.
    #[must_use]
    pub fn new(tag_name: &str, closed: NodeClosed, meta: Option<Rc<MetaElement>>, depth: usize) -> Self {
        let void_element = meta.as_ref().is_some_and(|m| m.void);
        Self {
            tag_name: tag_name.to_string(),
            closed,
            attrs: Vec::new(),
            meta,
            void_element,
            depth,
            annotation: None,
        }
    }

    /// Case-insensitive tag name test; `*` matches every element.
    #[must_use]
    pub fn is(&self, tag_name: &str) -> bool {
        tag_name == "*" || self.tag_name.eq_ignore_ascii_case(tag_name)
    }

    /// The annotation if set, otherwise `<tag>`.
    #[must_use]
    pub fn annotated_name(&self) -> String {
        self.annotation
            .clone()
            .unwrap_or_else(|| format!("<{}>", self.tag_name))
    }

    /// Set the annotation used by [`ElementData::annotated_name`].
    pub fn set_annotation(&mut self, annotation: impl Into<String>) {
        self.annotation = Some(annotation.into());
    }

    /// Add an attribute. The key is lower-cased; existing attributes with the
    /// same name are kept.
    pub fn set_attribute(
        &mut self,
        key: &str,
        value: Option<Value>,
        key_location: Location,
        value_location: Option<Location>,
        original_attribute: Option<String>,
    ) {
        self.attrs.push(Attribute::new(
            key,
            value,
            key_location,
            value_location,
            original_attribute,
        ));
    }

    /// All attributes in source order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Whether at least one attribute named `key` exists.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.get_attribute(key).is_some()
    }

    /// The first attribute named `key`.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&Attribute> {
        self.get_attribute_all(key).next()
    }

    /// Every attribute named `key`, in source order.
    pub fn get_attribute_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Attribute> + use<'a> {
        let key = key.to_ascii_lowercase();
        self.attrs.iter().filter(move |attr| attr.key == key)
    }

    /// The value of the first attribute named `key`.
    #[must_use]
    pub fn get_attribute_value(&self, key: &str) -> Option<&Value> {
        self.get_attribute(key).and_then(|attr| attr.value.as_ref())
    }

    /// Static class names from the `class` attribute.
    #[must_use]
    pub fn class_list(&self) -> DomTokenList {
        DomTokenList::new(self.get_attribute_value("class"))
    }

    /// The static `id` attribute value.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get_attribute_value("id").and_then(Value::as_static)
    }

    /// Replace the copyable fields of the bound metadata with those of `meta`.
    ///
    /// Only content categories, `transparent`, `form`, attribute rules and
    /// content-model rules transfer; everything else (void, foreign, implicit
    /// close triggers) stays with the element's own tag.
    pub fn load_meta(&mut self, meta: &MetaElement) {
        let mut merged = self.meta.as_deref().cloned().unwrap_or_default();
        merged.metadata = meta.metadata.clone();
        merged.flow = meta.flow.clone();
        merged.sectioning = meta.sectioning.clone();
        merged.heading = meta.heading.clone();
        merged.phrasing = meta.phrasing.clone();
        merged.embedded = meta.embedded.clone();
        merged.interactive = meta.interactive.clone();
        merged.transparent = meta.transparent;
        merged.form = meta.form;
        merged.required_attributes.clone_from(&meta.required_attributes);
        merged.attributes.clone_from(&meta.attributes);
        merged.permitted_content.clone_from(&meta.permitted_content);
        merged.permitted_descendants.clone_from(&meta.permitted_descendants);
        merged.permitted_order.clone_from(&meta.permitted_order);
        merged.required_ancestors.clone_from(&meta.required_ancestors);
        merged.required_content.clone_from(&meta.required_content);
        self.meta = Some(Rc::new(merged));
    }
}
