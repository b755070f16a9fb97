//! Schema error types
//!
//! Error codes:
//! - GW_SCHEMA_NOT_FOUND (REJECT)
//! - GW_SCHEMA_MALFORMED (FATAL for the request)
//! - GW_SCHEMA_LOAD_FAILED (REJECT, store unavailable or timed out)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected, caller may correct and retry
    Reject,
    /// Metadata itself is broken; no request for this function can succeed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// No metadata exists for the function name
    SchemaNotFound,
    /// Metadata exists but does not describe a valid schema
    SchemaMalformed,
    /// The metadata store could not be read in time
    SchemaLoadFailed,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaNotFound => "GW_SCHEMA_NOT_FOUND",
            SchemaErrorCode::SchemaMalformed => "GW_SCHEMA_MALFORMED",
            SchemaErrorCode::SchemaLoadFailed => "GW_SCHEMA_LOAD_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::SchemaMalformed => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    function_name: Option<String>,
    /// Location inside the metadata document, for malformed schemas
    location: Option<String>,
}

impl SchemaError {
    /// Create a schema not found error
    pub fn not_found(function_name: impl Into<String>) -> Self {
        let name = function_name.into();
        Self {
            code: SchemaErrorCode::SchemaNotFound,
            message: format!("Metadata for function '{}' not found", name),
            function_name: Some(name),
            location: None,
        }
    }

    /// Create an error for a metadata document that is not a valid schema
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            code: SchemaErrorCode::SchemaMalformed,
            message: format!("Malformed metadata at '{}': {}", location, reason.into()),
            function_name: None,
            location: Some(location),
        }
    }

    /// Create a load failure (I/O, timeout)
    pub fn load_failed(function_name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = function_name.into();
        Self {
            code: SchemaErrorCode::SchemaLoadFailed,
            message: format!("Failed to load metadata for function '{}': {}", name, reason.into()),
            function_name: Some(name),
            location: None,
        }
    }

    /// Attach the function name this error belongs to
    pub fn for_function(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the function name if known
    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    /// Returns the metadata location for malformed schemas
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Whether this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.code == SchemaErrorCode::SchemaNotFound
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
