//! Gateway error taxonomy
//!
//! Every failure leaves the gateway as a structured, machine-parseable
//! object:
//!
//! ```json
//! { "detail": { "error": "GW_VALIDATION_FAILED", "message": "...",
//!   "timestamp": "...", "type": "validation_error", "action": "...",
//!   "violations": [ ... ] } }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::response::FilteredResult;
use crate::schema::{SchemaError, SchemaErrorCode, ViolationList};

use super::transport::TransportError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway errors
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    // ==================
    // Rejected (no remote call attempted)
    // ==================
    /// No metadata registered for the function
    #[error("Function {0} not found in metadata store")]
    SchemaNotFound(String),

    /// Metadata exists but cannot be used
    #[error("{0}")]
    SchemaUnavailable(SchemaError),

    /// Payload does not satisfy the schema
    #[error("Validation failed for {function}: {violations}")]
    ValidationFailed {
        function: String,
        violations: ViolationList,
    },

    /// Request body is not a well-formed call request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ==================
    // Remote failures
    // ==================
    /// The remote system reported a failure through RETURN
    #[error("{message}")]
    RemoteInvocationFailed {
        function: String,
        message: String,
        response: FilteredResult,
    },

    /// Network or connection fault, or timeout
    #[error("Transport error calling {function}: {source}")]
    Transport {
        function: String,
        #[source]
        source: TransportError,
    },

    // ==================
    // Gateway faults
    // ==================
    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SchemaError> for GatewayError {
    fn from(err: SchemaError) -> Self {
        if err.is_not_found() {
            GatewayError::SchemaNotFound(err.function_name().unwrap_or_default().to_string())
        } else {
            GatewayError::SchemaUnavailable(err)
        }
    }
}

impl GatewayError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::SchemaNotFound(_) => SchemaErrorCode::SchemaNotFound.code(),
            GatewayError::SchemaUnavailable(err) => err.code().code(),
            GatewayError::ValidationFailed { .. } => "GW_VALIDATION_FAILED",
            GatewayError::InvalidRequest(_) => "GW_INVALID_REQUEST",
            GatewayError::RemoteInvocationFailed { .. } => "GW_REMOTE_INVOCATION_FAILED",
            GatewayError::Transport { .. } => "GW_TRANSPORT_ERROR",
            GatewayError::Internal(_) => "GW_INTERNAL",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            GatewayError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            GatewayError::SchemaNotFound(_) => StatusCode::NOT_FOUND,

            // 5xx
            GatewayError::SchemaUnavailable(err) => match err.code() {
                SchemaErrorCode::SchemaLoadFailed => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            GatewayError::RemoteInvocationFailed { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Transport { source, .. } => match source {
                TransportError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error category reported in the `type` field
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::SchemaNotFound(_)
            | GatewayError::SchemaUnavailable(_)
            | GatewayError::ValidationFailed { .. }
            | GatewayError::InvalidRequest(_) => "validation_error",
            GatewayError::RemoteInvocationFailed { .. } | GatewayError::Transport { .. } => {
                "remote_error"
            }
            GatewayError::Internal(_) => "internal_error",
        }
    }

    /// What the caller should do next
    pub fn action(&self) -> &'static str {
        match self {
            GatewayError::SchemaNotFound(_) => "Check the function name; no metadata is registered for it",
            GatewayError::SchemaUnavailable(err) => match err.code() {
                SchemaErrorCode::SchemaLoadFailed => "Retry later; the metadata store could not be read",
                _ => "Correct the metadata document for this function",
            },
            GatewayError::ValidationFailed { .. } => "Correct the listed parameters and resubmit",
            GatewayError::InvalidRequest(_) => "Send a JSON body with function_name and parameters",
            GatewayError::RemoteInvocationFailed { .. } => "Review the message returned by the remote system",
            GatewayError::Transport { source, .. } => {
                if source.is_retryable() {
                    "Retry the call later; the remote system did not answer"
                } else {
                    "Check the function name and the remote system configuration"
                }
            }
            GatewayError::Internal(_) => "Contact the gateway operator",
        }
    }

    /// Whether the request was rejected before any remote call
    pub fn is_rejection(&self) -> bool {
        self.error_type() == "validation_error"
    }

    pub fn violations(&self) -> Option<&ViolationList> {
        match self {
            GatewayError::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }

    /// Structured error detail stamped with the current time
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            error: self.code().to_string(),
            message: self.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            error_type: self.error_type().to_string(),
            action: self.action().to_string(),
            violations: self.violations().cloned(),
        }
    }
}

/// Body of an error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<ViolationList>,
}

/// Error response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

impl From<&GatewayError> for ErrorResponse {
    fn from(err: &GatewayError) -> Self {
        Self { detail: err.detail() }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}
