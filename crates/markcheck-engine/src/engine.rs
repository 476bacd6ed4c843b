//! The lint driver.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use markcheck_common::Event;
use markcheck_dom::{DomTree, NodeId};
use markcheck_html::{Lexer, ParseError, Parser, ParserEvent, Source};
use markcheck_meta::MetaTable;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::EngineError;
use crate::config::Config;
use crate::directive;
use crate::reporter::{Report, Reporter};
use crate::rule::{RuleDocumentation, RuleHandle, RuleRegistry};

/// One token in [`Engine::dump_tokens`] output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenDump {
    /// Token kind, e.g. `TAG_OPEN`.
    pub token: String,
    /// The matched text.
    pub data: String,
    /// `file:line:column`.
    pub location: String,
}

/// One event in [`Engine::dump_events`] output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDump {
    /// Event name, e.g. `tag:open`.
    pub event: &'static str,
    /// The event payload.
    pub data: Value,
}

/// Lints sources against a configuration.
///
/// The engine owns the resolved metadata table and the rule registry. Every
/// source gets a fresh parser, fresh rule handles and a fresh tree.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    registry: RuleRegistry,
    meta: Rc<MetaTable>,
}

impl Engine {
    /// An engine with the built-in rules.
    ///
    /// # Errors
    ///
    /// Fails when a metadata catalog is invalid or a rule rejects its
    /// options.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_registry(config, RuleRegistry::builtin())
    }

    /// An engine with a custom rule registry.
    ///
    /// # Errors
    ///
    /// See [`Engine::new`].
    pub fn with_registry(config: Config, registry: RuleRegistry) -> Result<Self, EngineError> {
        let mut meta = MetaTable::html5()?;
        for catalog in config.elements() {
            meta.load_from_value(catalog)?;
        }
        for (name, rule) in config.rules() {
            let _ = registry.instantiate(name, &rule.options)?;
        }
        debug!(
            target: "markcheck::engine",
            rules = config.rules().len(),
            elements = meta.len(),
            "engine ready"
        );
        Ok(Self {
            config,
            registry,
            meta: Rc::new(meta),
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The resolved metadata table.
    #[must_use]
    pub fn meta(&self) -> &MetaTable {
        &self.meta
    }

    /// Lint every source and collect the results.
    ///
    /// Tokenizer and parser faults in a source become a single
    /// `parser-error` message for that source.
    ///
    /// # Errors
    ///
    /// Fails on a malformed directive comment.
    pub fn lint(&self, sources: &[Source]) -> Result<Report, EngineError> {
        let reporter = Rc::new(RefCell::new(Reporter::new()));
        for source in sources {
            debug!(target: "markcheck::engine", filename = %source.filename, "linting");
            let parser = Parser::new(Rc::clone(&self.meta));
            let rules = self.setup_rules(&parser, &reporter)?;

            let tree = DomTree::new(source.start_location());
            parser.trigger(
                &ParserEvent::ConfigReady {
                    config: self.config.to_value(),
                    rules: rules.keys().cloned().collect(),
                    location: source.start_location().with_size(1),
                },
                &tree,
            );
            directive::register(&parser, &rules, &reporter);

            let result = parser.parse_html(source);
            // Listeners hold the rule handles and the parser itself.
            parser.events().clear();
            match result {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    reporter
                        .borrow_mut()
                        .add_parser_error(err.location(), err.to_string());
                }
                Err(err) => return Err(err.into()),
            }
        }
        let report = reporter.borrow_mut().save(sources);
        Ok(report)
    }

    fn setup_rules(
        &self,
        parser: &Parser,
        reporter: &Rc<RefCell<Reporter>>,
    ) -> Result<BTreeMap<String, RuleHandle>, EngineError> {
        let mut handles = BTreeMap::new();
        for (name, config) in self.config.rules() {
            let rule = self.registry.instantiate(name, &config.options)?;
            let handle = RuleHandle::new(name, config.severity, parser.clone(), Rc::clone(reporter));
            rule.setup(&handle);
            trace!(target: "markcheck::engine", rule = %name, severity = %config.severity, "rule ready");
            let _ = handles.insert(name.clone(), handle);
        }
        Ok(handles)
    }

    /// The token stream of each source.
    ///
    /// # Errors
    ///
    /// Fails on the first tokenizer error.
    pub fn dump_tokens(&self, sources: &[Source]) -> Result<Vec<TokenDump>, EngineError> {
        let mut lines = Vec::new();
        for source in sources {
            for token in Lexer::new(&source.data, source.start_location()) {
                let token = token.map_err(ParseError::from)?;
                lines.push(TokenDump {
                    token: token.kind.to_string(),
                    data: token.text().to_string(),
                    location: token.location.to_string(),
                });
            }
        }
        Ok(lines)
    }

    /// Every event the parser emits for each source.
    ///
    /// # Errors
    ///
    /// Fails when a source does not parse.
    pub fn dump_events(&self, sources: &[Source]) -> Result<Vec<EventDump>, EngineError> {
        let lines: Rc<RefCell<Vec<EventDump>>> = Rc::default();
        let parser = Parser::new(Rc::clone(&self.meta));
        let sink = Rc::clone(&lines);
        let _ = parser.on("*", move |event, _| {
            sink.borrow_mut().push(EventDump {
                event: event.name(),
                data: serde_json::to_value(event).unwrap_or(Value::Null),
            });
        });
        let result = sources.iter().try_for_each(|source| parser.parse_html(source).map(drop));
        parser.events().clear();
        result?;
        Ok(lines.take())
    }

    /// The element tree of each source, one line per element.
    ///
    /// ```text
    /// (root)
    /// └─┬ ul#menu
    ///   ├── li.active
    ///   └── li
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when a source does not parse.
    pub fn dump_tree(&self, sources: &[Source]) -> Result<Vec<String>, EngineError> {
        let parser = Parser::new(Rc::clone(&self.meta));
        let mut lines = Vec::new();
        for source in sources {
            let tree = parser.parse_html(source)?;
            lines.push("(root)".to_string());
            write_children(&tree, tree.root(), 1, &mut lines);
        }
        Ok(lines)
    }

    /// Documentation for a configured rule, specialised for `context` when
    /// given. `None` when the rule is not configured or not documented.
    #[must_use]
    pub fn get_rule_documentation(&self, rule_id: &str, context: Option<&Value>) -> Option<RuleDocumentation> {
        let config = self.config.rule(rule_id)?;
        let rule = self.registry.instantiate(rule_id, &config.options).ok()?;
        rule.documentation(context)
    }
}

fn write_children(tree: &DomTree, node: NodeId, level: usize, lines: &mut Vec<String>) {
    let children: Vec<NodeId> = tree.child_elements(node).collect();
    for (index, &child) in children.iter().enumerate() {
        let indent = "  ".repeat(level - 1);
        let branch = if index + 1 < children.len() { '├' } else { '└' };
        let fork = if tree.child_elements(child).next().is_some() { '┬' } else { '─' };
        let tag = tree.tag_name(child).unwrap_or_default();
        lines.push(format!("{indent}{branch}─{fork} {tag}{}", decoration(tree, child)));
        write_children(tree, child, level + 1, lines);
    }
}

fn decoration(tree: &DomTree, node: NodeId) -> String {
    let Some(element) = tree.as_element(node) else {
        return String::new();
    };
    let mut output = String::new();
    if let Some(id) = element.id() {
        output.push('#');
        output.push_str(id);
    }
    let class_list = element.class_list();
    let classes: Vec<&str> = class_list.iter().collect();
    if !classes.is_empty() {
        output.push('.');
        output.push_str(&classes.join("."));
    }
    output
}
