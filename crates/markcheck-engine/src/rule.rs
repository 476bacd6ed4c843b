//! The rule contract.
//!
//! A rule is a [`Rule`] object built from its options by a [`RuleFactory`].
//! For every linted source the engine wraps the rule in a fresh
//! [`RuleHandle`] (name, severity, enabled flag, access to the parser and
//! the reporter) and calls [`Rule::setup`], where the rule subscribes to
//! parser events through [`RuleHandle::on`] and reports violations through
//! [`RuleHandle::report`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use markcheck_common::Location;
use markcheck_dom::{DomTree, NodeId};
use markcheck_html::{Parser, ParserEvent};
use markcheck_meta::MetaTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConfigError;
use crate::reporter::{Message, Reporter};
use crate::severity::Severity;

/// Extended description of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDocumentation {
    /// What the rule checks, or, given a report's context, what is wrong with
    /// that specific occurrence.
    pub description: String,
}

impl RuleDocumentation {
    /// Documentation with the given description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A lint rule.
pub trait Rule {
    /// Subscribe to parser events. Called once per linted source.
    fn setup(&self, rule: &RuleHandle);

    /// Documentation, optionally specialised for the `context` attached to a
    /// reported message.
    fn documentation(&self, _context: Option<&Value>) -> Option<RuleDocumentation> {
        None
    }
}

/// Builds a rule from its configured options.
pub type RuleFactory = fn(name: &str, options: &Value) -> Result<Box<dyn Rule>, ConfigError>;

/// Deserialize rule options, treating `null` as "all defaults".
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOptions`] when the options do not fit `T`.
pub fn parse_options<T>(name: &str, options: &Value) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    Deserialize::deserialize(options).map_err(|err| ConfigError::InvalidOptions {
        rule: name.to_string(),
        message: err.to_string(),
    })
}

struct RuleState {
    name: String,
    severity: Cell<Severity>,
    enabled: Cell<bool>,
    parser: Parser,
    reporter: Rc<RefCell<Reporter>>,
    event_location: RefCell<Option<Location>>,
}

/// A rule's binding to one lint session.
///
/// Cheap to clone; clones share state. Listeners registered through
/// [`RuleHandle::on`] hold only a weak reference, so the handle does not
/// keep itself alive through the parser's event bus.
#[derive(Clone)]
pub struct RuleHandle(Rc<RuleState>);

impl fmt::Debug for RuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleHandle")
            .field("name", &self.0.name)
            .field("severity", &self.0.severity.get())
            .field("enabled", &self.0.enabled.get())
            .finish_non_exhaustive()
    }
}

impl RuleHandle {
    /// Bind rule `name` at `severity` to a parser and a reporter.
    #[must_use]
    pub fn new(name: &str, severity: Severity, parser: Parser, reporter: Rc<RefCell<Reporter>>) -> Self {
        Self(Rc::new(RuleState {
            name: name.to_string(),
            severity: Cell::new(severity),
            enabled: Cell::new(true),
            parser,
            reporter,
            event_location: RefCell::new(None),
        }))
    }

    /// The configured rule id.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Current severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.0.severity.get()
    }

    /// Change the severity.
    pub fn set_severity(&self, severity: Severity) {
        self.0.severity.set(severity);
    }

    /// Toggle the enabled flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    /// Enabled flag set and severity at least [`Severity::Warn`].
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.enabled.get() && self.0.severity.get() >= Severity::Warn
    }

    /// The metadata table of the session.
    #[must_use]
    pub fn meta(&self) -> &MetaTable {
        self.0.parser.meta()
    }

    /// Subscribe to parser events. The callback runs only while the rule is
    /// enabled, and reports made from it default to the event's location.
    pub fn on<F>(&self, names: &str, callback: F)
    where
        F: Fn(&Self, &ParserEvent, &DomTree) + 'static,
    {
        let state: Weak<RuleState> = Rc::downgrade(&self.0);
        let _ = self.0.parser.on(names, move |event, tree| {
            let Some(state) = state.upgrade() else {
                return;
            };
            let rule = Self(state);
            if !rule.is_enabled() {
                return;
            }
            *rule.0.event_location.borrow_mut() = event.location().cloned();
            callback(&rule, event, tree);
        });
    }

    /// Report a violation on `node` (or on no node), located at the current
    /// event or, failing that, at the node.
    pub fn report(&self, tree: &DomTree, node: Option<NodeId>, message: impl Into<String>) {
        self.report_with(tree, node, message, None, None);
    }

    /// Report a violation with an explicit location and context.
    ///
    /// Dropped unless the rule is enabled and not disabled on `node`. The
    /// location is the first of `location`, the current event's location
    /// and the node's location.
    pub fn report_with(
        &self,
        tree: &DomTree,
        node: Option<NodeId>,
        message: impl Into<String>,
        location: Option<&Location>,
        context: Option<Value>,
    ) {
        if !self.is_enabled() || node.is_some_and(|node| !tree.rule_enabled(node, self.name())) {
            return;
        }
        let location = location
            .cloned()
            .or_else(|| self.0.event_location.borrow().clone())
            .unwrap_or_else(|| tree.location(node.unwrap_or(NodeId::ROOT)).clone());
        let selector = node.and_then(|node| tree.generate_selector(node));
        let message = Message::new(self.name(), self.severity(), message, &location)
            .with_selector(selector)
            .with_context(context);
        self.0.reporter.borrow_mut().add(&location.filename, message);
    }
}

/// Rule factories by name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    factories: BTreeMap<String, RuleFactory>,
}

impl RuleRegistry {
    /// A registry without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in rule.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::rules::register_builtin(&mut registry);
        registry
    }

    /// Add or replace a rule.
    pub fn register(&mut self, name: &str, factory: RuleFactory) {
        let _ = self.factories.insert(name.to_string(), factory);
    }

    /// Whether a rule is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build rule `name` from `options`. Unregistered names yield a rule
    /// that reports its own absence.
    ///
    /// # Errors
    ///
    /// Returns the factory's [`ConfigError`] for invalid options.
    pub fn instantiate(&self, name: &str, options: &Value) -> Result<Box<dyn Rule>, ConfigError> {
        match self.factories.get(name) {
            Some(factory) => factory(name, options),
            None => {
                tracing::debug!(target: "markcheck::engine", rule = name, "rule is not registered");
                Ok(Box::new(MissingRule {
                    name: name.to_string(),
                }))
            }
        }
    }
}

/// Stand-in for a configured rule that is not registered.
struct MissingRule {
    name: String,
}

impl Rule for MissingRule {
    fn setup(&self, rule: &RuleHandle) {
        let message = format!("Definition for rule '{}' was not found", self.name);
        rule.on("dom:ready", move |rule, _, tree| {
            rule.report(tree, None, message.clone());
        });
    }
}
