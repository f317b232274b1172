//! Accuracy rules.
//!
//! Rules are stored in `quality_rules` as a `rule_type` discriminator plus a
//! JSON `rule_config` blob. They are parsed once into the closed [`RuleKind`]
//! union so the metric calculator can match on them exhaustively.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::monitored::{ColumnKind, MonitoredRecord, MonitoredTable};

pub const RULE_NOT_NULL: &str = "not_null";
pub const RULE_RANGE_CHECK: &str = "range_check";
pub const RULE_FORMAT_CHECK: &str = "format_check";
pub const RULE_POSITIVE_CHECK: &str = "positive_check";

/// All valid `rule_type` values.
pub const VALID_RULE_TYPES: &[&str] = &[
    RULE_NOT_NULL,
    RULE_RANGE_CHECK,
    RULE_FORMAT_CHECK,
    RULE_POSITIVE_CHECK,
];

/// The kind of check a rule performs on its column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// The column must be non-null.
    NotNull,
    /// The column must be a number in `[min, max]` (inclusive).
    Range { min: f64, max: f64 },
    /// The column must be a number strictly greater than zero.
    Positive,
    /// The column must be text matching `pattern`.
    Format { pattern: String },
}

#[derive(Deserialize)]
struct RangeConfig {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct FormatConfig {
    pattern: String,
}

/// A rule bound to a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRule {
    pub column: String,
    pub kind: RuleKind,
}

impl ColumnRule {
    pub fn new(column: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }

    /// Build a rule from its stored representation.
    pub fn from_config(
        column: &str,
        rule_type: &str,
        rule_config: Option<&serde_json::Value>,
    ) -> Result<Self, CoreError> {
        let kind = match rule_type {
            RULE_NOT_NULL => RuleKind::NotNull,
            RULE_POSITIVE_CHECK => RuleKind::Positive,
            RULE_RANGE_CHECK => {
                let cfg: RangeConfig = parse_config(rule_type, rule_config)?;
                RuleKind::Range {
                    min: cfg.min,
                    max: cfg.max,
                }
            }
            RULE_FORMAT_CHECK => {
                let cfg: FormatConfig = parse_config(rule_type, rule_config)?;
                RuleKind::Format {
                    pattern: cfg.pattern,
                }
            }
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown rule type: '{other}'. Valid types: {}",
                    VALID_RULE_TYPES.join(", ")
                )))
            }
        };
        let rule = Self::new(column, kind);
        rule.validate_parameters()?;
        Ok(rule)
    }

    /// The `rule_type` discriminator stored alongside the config.
    pub fn rule_type(&self) -> &'static str {
        match self.kind {
            RuleKind::NotNull => RULE_NOT_NULL,
            RuleKind::Range { .. } => RULE_RANGE_CHECK,
            RuleKind::Positive => RULE_POSITIVE_CHECK,
            RuleKind::Format { .. } => RULE_FORMAT_CHECK,
        }
    }

    /// The JSON parameters stored in `rule_config`.
    pub fn config_json(&self) -> Option<serde_json::Value> {
        match &self.kind {
            RuleKind::NotNull | RuleKind::Positive => None,
            RuleKind::Range { min, max } => Some(serde_json::json!({ "min": min, "max": max })),
            RuleKind::Format { pattern } => Some(serde_json::json!({ "pattern": pattern })),
        }
    }

    /// Stable label used as the key in per-rule validation results.
    pub fn label(&self) -> String {
        format!("{}_{}", self.column, self.rule_type())
    }

    /// Check the rule against the table schema.
    ///
    /// The column must exist; range and positive checks need a numeric
    /// column and format checks a text column.
    pub fn validate_for(&self, table: MonitoredTable) -> Result<(), CoreError> {
        let column = table.column(&self.column).ok_or_else(|| {
            CoreError::Validation(format!(
                "Column '{}' does not exist on {}",
                self.column,
                table.name()
            ))
        })?;
        match (&self.kind, column.kind) {
            (RuleKind::NotNull, _)
            | (RuleKind::Range { .. }, ColumnKind::Number)
            | (RuleKind::Positive, ColumnKind::Number)
            | (RuleKind::Format { .. }, ColumnKind::Text) => Ok(()),
            _ => Err(CoreError::Validation(format!(
                "{} cannot be applied to column '{}' of {}",
                self.rule_type(),
                self.column,
                table.name()
            ))),
        }
    }

    fn validate_parameters(&self) -> Result<(), CoreError> {
        match &self.kind {
            RuleKind::NotNull | RuleKind::Positive => Ok(()),
            RuleKind::Range { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(CoreError::Validation(
                        "range_check bounds must be finite numbers".into(),
                    ));
                }
                if min > max {
                    return Err(CoreError::Validation(format!(
                        "range_check min ({min}) must be <= max ({max})"
                    )));
                }
                Ok(())
            }
            RuleKind::Format { pattern } => Regex::new(pattern).map(|_| ()).map_err(|e| {
                CoreError::Validation(format!("format_check pattern is invalid: {e}"))
            }),
        }
    }

    /// Compile the rule for repeated evaluation.
    pub fn compile(&self) -> Result<CompiledRule, CoreError> {
        self.validate_parameters()?;
        let check = match &self.kind {
            RuleKind::NotNull => Check::NotNull,
            RuleKind::Positive => Check::Positive,
            RuleKind::Range { min, max } => Check::Range {
                min: *min,
                max: *max,
            },
            RuleKind::Format { pattern } => Check::Format(
                Regex::new(pattern)
                    .map_err(|e| CoreError::Validation(format!("invalid pattern: {e}")))?,
            ),
        };
        Ok(CompiledRule {
            rule: self.clone(),
            check,
        })
    }
}

fn parse_config<T: for<'de> Deserialize<'de>>(
    rule_type: &str,
    rule_config: Option<&serde_json::Value>,
) -> Result<T, CoreError> {
    let value = rule_config
        .ok_or_else(|| CoreError::Validation(format!("{rule_type} requires a rule_config")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Validation(format!("Invalid {rule_type} rule_config: {e}")))
}

#[derive(Debug, Clone)]
enum Check {
    NotNull,
    Range { min: f64, max: f64 },
    Positive,
    Format(Regex),
}

/// A rule ready to be evaluated against records.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: ColumnRule,
    check: Check,
}

impl CompiledRule {
    /// Whether the record satisfies the rule. NULL fails every check.
    pub fn passes(&self, record: &MonitoredRecord) -> bool {
        let column = self.rule.column.as_str();
        match &self.check {
            Check::NotNull => !record.is_null(column),
            Check::Range { min, max } => record
                .number(column)
                .is_some_and(|v| v >= *min && v <= *max),
            Check::Positive => record.number(column).is_some_and(|v| v > 0.0),
            Check::Format(re) => record.text(column).is_some_and(|s| re.is_match(s)),
        }
    }
}
