use std::fmt;
use std::rc::Rc;

use markcheck_common::Location;
use markcheck_dom::{DomTree, NodeId, Value};
use markcheck_meta::MetaTable;

/// An attribute as read from a tag, before it is recorded on the element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeData {
    /// Attribute name.
    pub key: String,
    /// Attribute value; `None` for attributes written without one.
    pub value: Option<Value>,
    /// Quote character used for the value.
    pub quote: Option<char>,
    /// For attributes produced by a transform, the raw attribute name.
    pub original_attribute: Option<String>,
}

/// Expands one raw attribute into zero or more logical attributes.
pub type ProcessAttribute = Rc<dyn Fn(AttributeData) -> Vec<AttributeData>>;

/// Adjusts an element once it is closed, e.g. to set an annotation or load
/// metadata of another tag.
pub type ProcessElement = Rc<dyn Fn(&mut DomTree, NodeId, &MetaTable)>;

/// Transform hooks supplied by template-language preprocessors.
#[derive(Clone, Default)]
pub struct SourceHooks {
    /// Called for every attribute.
    pub process_attribute: Option<ProcessAttribute>,
    /// Called for every element when it is closed.
    pub process_element: Option<ProcessElement>,
}

impl fmt::Debug for SourceHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceHooks")
            .field("process_attribute", &self.process_attribute.is_some())
            .field("process_element", &self.process_element.is_some())
            .finish()
    }
}

/// A document to parse.
///
/// `line`, `column` and `offset` position the text inside a larger file,
/// e.g. a template extracted from a component.
#[derive(Debug, Clone)]
pub struct Source {
    /// The markup.
    pub data: String,
    /// Name used in locations.
    pub filename: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Transform hooks.
    pub hooks: SourceHooks,
}

impl Source {
    /// A source starting at the beginning of `filename`.
    #[must_use]
    pub fn new(data: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            line: 1,
            column: 1,
            offset: 0,
            hooks: SourceHooks::default(),
        }
    }

    /// A source for a plain string, named `inline`.
    #[must_use]
    pub fn inline(data: impl Into<String>) -> Self {
        Self::new(data, "inline")
    }

    /// Attach transform hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: SourceHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Zero-sized location of the first character.
    #[must_use]
    pub fn start_location(&self) -> Location {
        Location::new(self.filename.clone(), self.offset, self.line, self.column, 0)
    }
}

impl From<&str> for Source {
    fn from(data: &str) -> Self {
        Self::inline(data)
    }
}
