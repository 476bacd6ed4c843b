//! Engine configuration.
//!
//! ```json
//! {
//!   "rules": {
//!     "void": ["error", { "style": "selfclose" }],
//!     "no-dup-attr": "warn",
//!     "missing-doctype": 0
//!   },
//!   "elements": [{ "my-button": { "flow": true, "phrasing": true } }]
//! }
//! ```
//!
//! A rule entry is a severity, `[severity]` or `[severity, options]`.
//! `elements` lists extra metadata catalogs merged over the bundled HTML5
//! catalog in order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::rules::BUILTIN_RULES;
use crate::severity::Severity;

/// A fault in the configuration. Raised before any document is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or has unknown keys.
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A severity is not one of the known values.
    #[error("Invalid severity \"{value}\" for rule \"{rule}\"")]
    InvalidSeverity {
        /// The rule being configured.
        rule: String,
        /// The offending value.
        value: String,
    },

    /// A rule entry has the wrong shape.
    #[error("invalid configuration for rule \"{rule}\": expected a severity or [severity, options]")]
    InvalidRule {
        /// The rule being configured.
        rule: String,
    },

    /// Rule options were rejected by the rule.
    #[error("invalid options for rule \"{rule}\": {message}")]
    InvalidOptions {
        /// The rule being configured.
        rule: String,
        /// What is wrong.
        message: String,
    },
}

/// Severity and options for one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    /// Configured severity.
    pub severity: Severity,
    /// Rule options; an empty object when none were given.
    pub options: Value,
}

impl RuleConfig {
    /// A rule at `severity` with default options.
    #[must_use]
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Value::Object(Map::new()),
        }
    }

    fn parse(rule: &str, value: &Value) -> Result<Self, ConfigError> {
        let Value::Array(items) = value else {
            return Ok(Self::new(Severity::parse(rule, value)?));
        };
        match items.as_slice() {
            [severity] => Ok(Self::new(Severity::parse(rule, severity)?)),
            [severity, options] => Ok(Self {
                severity: Severity::parse(rule, severity)?,
                options: options.clone(),
            }),
            _ => Err(ConfigError::InvalidRule {
                rule: rule.to_string(),
            }),
        }
    }
}

impl Serialize for RuleConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.severity, &self.options).serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    rules: BTreeMap<String, Value>,
    #[serde(default)]
    elements: Vec<Value>,
}

/// Resolved configuration: rule settings and extra metadata catalogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    rules: BTreeMap<String, RuleConfig>,
    elements: Vec<Value>,
}

impl Config {
    /// An empty configuration: no rules, bundled metadata only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in rule enabled as an error.
    #[must_use]
    pub fn recommended() -> Self {
        let mut config = Self::new();
        for name in BUILTIN_RULES {
            config.set_rule(name, RuleConfig::new(Severity::Error));
        }
        config
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for malformed JSON, unknown keys, invalid
    /// severities and badly shaped rule entries.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build a configuration from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// See [`Config::from_json`].
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let raw = RawConfig::deserialize(value)?;
        let rules = raw
            .rules
            .iter()
            .map(|(name, value)| -> Result<_, ConfigError> {
                Ok((name.clone(), RuleConfig::parse(name, value)?))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            rules,
            elements: raw.elements,
        })
    }

    /// Overlay `other`: its rules replace ours, its catalogs are appended.
    pub fn extend(&mut self, other: Self) {
        self.rules.extend(other.rules);
        self.elements.extend(other.elements);
    }

    /// Configure a rule, replacing any previous setting.
    pub fn set_rule(&mut self, name: &str, rule: RuleConfig) {
        let _ = self.rules.insert(name.to_string(), rule);
    }

    /// Append a metadata catalog.
    pub fn add_elements(&mut self, catalog: Value) {
        self.elements.push(catalog);
    }

    /// Configured rules by name.
    #[must_use]
    pub const fn rules(&self) -> &BTreeMap<String, RuleConfig> {
        &self.rules
    }

    /// Settings of one rule.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.get(name)
    }

    /// Extra metadata catalogs, in merge order.
    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// The configuration as JSON, in the form [`Config::from_value`] reads.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
