//! Validation violations
//!
//! A violation names the exact payload location that failed
//! (`DOC_HEADER.REQ_DATE_H`, `DOC_ITEM[2].MATERIAL`) and why.
//! Violations are always collected into a complete list; a non-empty
//! list rejects the whole request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a payload location failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    /// Required value absent
    #[serde(rename = "MISSING_REQUIRED")]
    MissingRequired,
    /// Value could not be coerced to the declared type or length
    #[serde(rename = "TYPE_OR_LENGTH_VIOLATION")]
    TypeOrLengthViolation,
    /// Value present but not declared (only under the reject policy)
    #[serde(rename = "UNKNOWN_FIELD")]
    UnknownField,
    /// Structure is not an object or table is not a sequence of rows
    #[serde(rename = "INVALID_SHAPE")]
    InvalidShape,
    /// Table row count outside declared bounds
    #[serde(rename = "ROW_COUNT_VIOLATION")]
    RowCountViolation,
}

impl ReasonCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ReasonCode::MissingRequired => "MISSING_REQUIRED",
            ReasonCode::TypeOrLengthViolation => "TYPE_OR_LENGTH_VIOLATION",
            ReasonCode::UnknownField => "UNKNOWN_FIELD",
            ReasonCode::InvalidShape => "INVALID_SHAPE",
            ReasonCode::RowCountViolation => "ROW_COUNT_VIOLATION",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One failed payload location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted/indexed path to the value
    #[serde(rename = "field")]
    pub path: String,
    /// Reason code
    pub reason: ReasonCode,
    /// Human-readable detail
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason,
            message: message.into(),
        }
    }

    pub fn missing_required(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("Missing required parameter: {}", path);
        Self::new(path, ReasonCode::MissingRequired, message)
    }

    pub fn unknown_field(path: impl Into<String>) -> Self {
        let path = path.into();
        let message = format!("Undeclared parameter: {}", path);
        Self::new(path, ReasonCode::UnknownField, message)
    }

    pub fn invalid_shape(path: impl Into<String>, expected: &str, found: &str) -> Self {
        Self::new(
            path,
            ReasonCode::InvalidShape,
            format!("expected {}, got {}", expected, found),
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path, self.reason, self.message)
    }
}

/// Ordered, complete list of violations for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationList(Vec<Violation>);

impl ViolationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// Paths of all violations, in order
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.path.as_str()).collect()
    }

    /// Finds the first violation at an exact path
    pub fn at(&self, path: &str) -> Option<&Violation> {
        self.0.iter().find(|v| v.path == path)
    }

    /// One-line summary for messages and logs
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|v| format!("{} ({})", v.path, v.reason))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s): {}", self.len(), self.summary())
    }
}

/// Joins a parent path and a member name.
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Appends a zero-based row index to a table path.
pub(crate) fn row_path(table_path: &str, index: usize) -> String {
    format!("{}[{}]", table_path, index)
}
