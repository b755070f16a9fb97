//! Observability subsystem
//!
//! - Structured logging through `tracing`
//! - Typed lifecycle and invocation events
//! - Monotonic counters
//!
//! Observability is read-only: it never changes the outcome of a call.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{env_filter, init_logging, LogFormat, LOG_ENV};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use std::fmt;

/// Observability error
///
/// Observability failure must never abort a request.
#[derive(Debug)]
pub struct ObservabilityError {
    message: String,
}

impl ObservabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] GW_OBSERVABILITY_FAILED: {}", self.message)
    }
}

impl std::error::Error for ObservabilityError {}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Log a typed event with string fields.
///
/// Failure events are logged at WARN, everything else at INFO.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let rendered = render_fields(fields);
    if event.is_failure() {
        tracing::warn!(event = event.as_str(), fields = %rendered);
    } else {
        tracing::info!(event = event.as_str(), fields = %rendered);
    }
}

/// Renders fields as `k=v` pairs sorted by key.
fn render_fields(fields: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
