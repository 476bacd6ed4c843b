use markcheck_common::{Event, Location};
use markcheck_dom::{NodeId, Value};
use serde::Serialize;
use strum_macros::IntoStaticStr;

/// An event emitted by the parser or the engine.
///
/// Listeners receive the event together with the document tree. Node
/// references are ids into that tree. Every variant has a `location`;
/// only `dom:load` and `dom:ready` may carry `None`, so that rules reporting
/// from them fall back to the location of the node they report on.
#[derive(Debug, Clone, PartialEq, Serialize, IntoStaticStr)]
#[serde(untagged)]
pub enum ParserEvent {
    /// Configuration is resolved, before any document is parsed.
    #[strum(serialize = "config:ready")]
    ConfigReady {
        /// The effective configuration.
        config: serde_json::Value,
        /// Names of the rules that were instantiated.
        rules: Vec<String>,
        /// First character of the source being linted.
        location: Location,
    },

    /// Parsing is about to start. The tree is empty.
    #[strum(serialize = "dom:load")]
    DomLoad {
        /// Always `None`.
        location: Option<Location>,
    },

    /// The tree is complete and its metadata resolved.
    #[strum(serialize = "dom:ready")]
    DomReady {
        /// Always `None`.
        location: Option<Location>,
    },

    /// A doctype was read.
    #[strum(serialize = "doctype")]
    Doctype {
        /// The doctype value, e.g. `html`.
        value: String,
        /// Location of the value.
        value_location: Location,
        /// Location of `<!DOCTYPE`.
        location: Location,
    },

    /// An element was opened. Its attributes follow as `attr` events.
    #[strum(serialize = "tag:open")]
    TagOpen {
        /// The new element.
        target: NodeId,
        /// Location of the start tag.
        location: Location,
    },

    /// An element was closed, explicitly or implicitly.
    #[strum(serialize = "tag:close")]
    TagClose {
        /// The node built from the closing tag; `None` when closed by the end
        /// of the document.
        target: Option<NodeId>,
        /// The element being closed.
        previous: NodeId,
        /// Location of the closing tag.
        location: Location,
    },

    /// An element and all its children are complete.
    #[strum(serialize = "element:ready")]
    ElementReady {
        /// The completed element.
        target: NodeId,
        /// Location of the element.
        location: Location,
    },

    /// An attribute was read (after transform hooks).
    #[strum(serialize = "attr")]
    Attr {
        /// The element carrying the attribute.
        target: NodeId,
        /// Attribute name as written (after transforms).
        key: String,
        /// Attribute value, if any.
        value: Option<Value>,
        /// Quote character used for the value.
        quote: Option<char>,
        /// Raw attribute this one was derived from by a transform.
        original_attribute: Option<String>,
        /// Location of the attribute name.
        location: Location,
        /// Location of the value, when non-empty.
        value_location: Option<Location>,
    },

    /// Whitespace between markup.
    #[strum(serialize = "whitespace")]
    Whitespace {
        /// The whitespace text.
        text: String,
        /// Its location.
        location: Location,
    },

    /// Character data or a templating fragment.
    #[strum(serialize = "text")]
    Text {
        /// The text.
        text: String,
        /// Its location.
        location: Location,
    },

    /// An IE conditional comment marker.
    #[strum(serialize = "conditional")]
    Conditional {
        /// The condition, e.g. `if IE 6`.
        condition: String,
        /// Location of the marker.
        location: Location,
    },

    /// A directive comment: `<!-- [html-validate-action data : comment] -->`.
    #[strum(serialize = "directive")]
    Directive {
        /// The action, e.g. `disable-next`.
        action: String,
        /// Arguments, e.g. a rule list.
        data: String,
        /// Free-form comment after `:`.
        comment: String,
        /// Location of the directive comment.
        location: Location,
    },
}

impl ParserEvent {
    /// The location carried by the event, if any.
    #[must_use]
    pub const fn location(&self) -> Option<&Location> {
        match self {
            Self::DomLoad { location } | Self::DomReady { location } => location.as_ref(),
            Self::ConfigReady { location, .. }
            | Self::Doctype { location, .. }
            | Self::TagOpen { location, .. }
            | Self::TagClose { location, .. }
            | Self::ElementReady { location, .. }
            | Self::Attr { location, .. }
            | Self::Whitespace { location, .. }
            | Self::Text { location, .. }
            | Self::Conditional { location, .. }
            | Self::Directive { location, .. } => Some(location),
        }
    }
}

impl Event for ParserEvent {
    fn name(&self) -> &'static str {
        self.into()
    }
}
