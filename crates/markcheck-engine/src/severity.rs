//! Rule severities.

use markcheck_common::warning::warn_once;
use serde::{Serialize, Serializer};
use strum_macros::{Display, IntoStaticStr};

use crate::config::ConfigError;

/// How serious a rule violation is.
///
/// Ordered: a rule reports only when its severity is at least
/// [`Severity::Warn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// The rule is off.
    Disabled,
    /// Violations are warnings.
    Warn,
    /// Violations are errors.
    Error,
}

impl Severity {
    /// Numeric form used in configuration files and reports.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Warn => 1,
            Self::Error => 2,
        }
    }

    /// Parse a configured severity: `0`/`"off"`, `1`/`"warn"` or
    /// `2`/`"error"`. The old alias `"disable"` is accepted with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSeverity`] for anything else.
    pub fn parse(rule: &str, value: &serde_json::Value) -> Result<Self, ConfigError> {
        if let Some(number) = value.as_u64() {
            return match number {
                0 => Ok(Self::Disabled),
                1 => Ok(Self::Warn),
                2 => Ok(Self::Error),
                _ => Err(invalid(rule, value)),
            };
        }
        match value.as_str() {
            Some("off") => Ok(Self::Disabled),
            Some("disable") => {
                let _ = warn_once(
                    "config",
                    "Deprecated alias \"disable\" will be removed, replace with severity \"off\"",
                );
                Ok(Self::Disabled)
            }
            Some("warn") => Ok(Self::Warn),
            Some("error") => Ok(Self::Error),
            _ => Err(invalid(rule, value)),
        }
    }
}

fn invalid(rule: &str, value: &serde_json::Value) -> ConfigError {
    let value = value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string);
    ConfigError::InvalidSeverity {
        rule: rule.to_string(),
        value,
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_number())
    }
}
