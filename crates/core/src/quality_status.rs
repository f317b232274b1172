//! Severity and lifecycle values for quality issues.
//!
//! The string forms must match the values stored in the
//! `quality_issues.severity` and `quality_issues.status` columns.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How serious a quality issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parse a stored or user-supplied severity (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(CoreError::Validation(format!(
                "Unknown severity: '{value}'. Valid values: LOW, MEDIUM, HIGH, CRITICAL"
            ))),
        }
    }
}

/// Lifecycle status of a quality issue.
///
/// `Open` is the only non-terminal state. Nothing in the engine moves an
/// issue back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    Resolved,
    Ignored,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Resolved => "RESOLVED",
            Self::Ignored => "IGNORED",
        }
    }

    /// Parse a stored or user-supplied status (case-insensitive).
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "RESOLVED" => Ok(Self::Resolved),
            "IGNORED" => Ok(Self::Ignored),
            _ => Err(CoreError::Validation(format!(
                "Unknown issue status: '{value}'. Valid values: OPEN, RESOLVED, IGNORED"
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}
