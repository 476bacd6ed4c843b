//! Accumulated lint results.

use std::collections::BTreeMap;

use markcheck_common::Location;
use markcheck_html::Source;
use serde::Serialize;

use crate::severity::Severity;

/// Rule id used for tokenizer and parser faults.
pub const PARSER_ERROR: &str = "parser-error";

/// One reported violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// The reporting rule, or [`PARSER_ERROR`].
    pub rule_id: String,
    /// Severity of the rule when it reported.
    pub severity: Severity,
    /// Human readable description.
    pub message: String,
    /// Byte offset of the violation.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Length of the offending span in bytes.
    pub size: usize,
    /// Selector identifying the offending element, if any.
    pub selector: Option<String>,
    /// Rule-specific data used to produce contextual documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl Message {
    /// A message positioned at `location`.
    #[must_use]
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>, location: &Location) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            offset: location.offset,
            line: location.line,
            column: location.column,
            size: location.size,
            selector: None,
            context: None,
        }
    }

    /// Attach a selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        self.selector = selector;
        self
    }

    /// Attach rule context.
    #[must_use]
    pub fn with_context(mut self, context: Option<serde_json::Value>) -> Self {
        self.context = context;
        self
    }
}

/// Results for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    /// The source's filename.
    pub file_path: String,
    /// Messages sorted by position.
    pub messages: Vec<Message>,
    /// Number of error messages.
    pub error_count: usize,
    /// Number of warning messages.
    pub warning_count: usize,
}

/// Results of a lint run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// `true` when no errors were reported (warnings are allowed).
    pub valid: bool,
    /// Per-source results, one per linted source.
    pub results: Vec<FileResult>,
    /// Total number of errors.
    pub error_count: usize,
    /// Total number of warnings.
    pub warning_count: usize,
}

impl Report {
    /// All messages of all files, in file order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.results.iter().flat_map(|result| &result.messages)
    }
}

/// Collects messages keyed by filename.
#[derive(Debug, Default)]
pub struct Reporter {
    results: BTreeMap<String, Vec<Message>>,
}

impl Reporter {
    /// An empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `filename`.
    pub fn add(&mut self, filename: &str, message: Message) {
        tracing::trace!(
            target: "markcheck::reporter",
            rule = %message.rule_id,
            line = message.line,
            column = message.column,
            "{}",
            message.message
        );
        self.results.entry(filename.to_string()).or_default().push(message);
    }

    /// Record a [`PARSER_ERROR`] at `location`.
    pub fn add_parser_error(&mut self, location: &Location, message: impl Into<String>) {
        self.add(
            &location.filename,
            Message::new(PARSER_ERROR, Severity::Error, message, location),
        );
    }

    /// Drain the collected messages into a report covering `sources`.
    ///
    /// Every source gets an entry, in the order given, even when clean.
    pub fn save(&mut self, sources: &[Source]) -> Report {
        let mut results: Vec<FileResult> = Vec::with_capacity(sources.len());
        for source in sources {
            if results.iter().any(|result| result.file_path == source.filename) {
                continue;
            }
            let mut messages = self.results.remove(&source.filename).unwrap_or_default();
            messages.sort_by_key(|message| (message.line, message.column));
            let error_count = count(&messages, Severity::Error);
            let warning_count = count(&messages, Severity::Warn);
            results.push(FileResult {
                file_path: source.filename.clone(),
                messages,
                error_count,
                warning_count,
            });
        }
        let error_count = results.iter().map(|result| result.error_count).sum();
        let warning_count = results.iter().map(|result| result.warning_count).sum();
        Report {
            valid: error_count == 0,
            results,
            error_count,
            warning_count,
        }
    }
}

fn count(messages: &[Message], severity: Severity) -> usize {
    messages.iter().filter(|message| message.severity == severity).count()
}
