//! Observable gateway events
//!
//! Events are explicit and typed. Each maps to a stable string that
//! appears as the `event` field of the emitted log record.

use std::fmt;

/// Observable events in the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Gateway startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// HTTP listener bound, ready to serve
    Serving,
    /// Shutdown complete
    ShutdownComplete,

    // Schema
    /// Schema read and parsed from the store
    SchemaLoaded,
    /// Schema served from cache
    SchemaCacheHit,
    /// Schema missing, malformed or unreadable
    SchemaLoadFailed,

    // Invocation
    /// Call request accepted for processing
    RequestReceived,
    /// Payload failed validation
    ValidationRejected,
    /// Remote call dispatched
    RemoteCallStarted,
    /// Remote call returned without a failure message
    RemoteCallSucceeded,
    /// Remote call returned a failure message
    RemoteCallFailed,
    /// Transport failed or timed out
    TransportFailed,
    /// Response projected and returned
    Responded,

    // Table reads
    /// Table read executed
    TableReadExecuted,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "GATEWAY_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaCacheHit => "SCHEMA_CACHE_HIT",
            Event::SchemaLoadFailed => "SCHEMA_LOAD_FAILED",

            Event::RequestReceived => "REQUEST_RECEIVED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::RemoteCallStarted => "REMOTE_CALL_STARTED",
            Event::RemoteCallSucceeded => "REMOTE_CALL_SUCCEEDED",
            Event::RemoteCallFailed => "REMOTE_CALL_FAILED",
            Event::TransportFailed => "TRANSPORT_FAILED",
            Event::Responded => "RESPONDED",

            Event::TableReadExecuted => "TABLE_READ_EXECUTED",
        }
    }

    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::SchemaLoadFailed
                | Event::ValidationRejected
                | Event::RemoteCallFailed
                | Event::TransportFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
