//! Invocation state machine
//!
//! ```text
//! RECEIVED -> SCHEMA_LOADED -> VALIDATED -> MARSHALED -> CALLED -> FILTERED -> RESPONDED
//!     |             |                           |           |
//!     +-> REJECTED  +-> REJECTED                +-----------+-> REMOTE_FAILED
//! ```
//!
//! - States are explicit and enumerable
//! - Transitions only move forward
//! - REJECTED means no remote call was attempted
//! - RESPONDED, REJECTED and REMOTE_FAILED are terminal

use std::fmt;

use serde::Serialize;

use super::errors::GatewayError;

/// Lifecycle state of one call request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvocationState {
    Received,
    SchemaLoaded,
    Validated,
    Marshaled,
    Called,
    Filtered,
    Responded,
    /// Schema or validation failure; no remote call attempted
    Rejected,
    /// Remote system or transport reported a failure
    RemoteFailed,
}

impl InvocationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Received => "RECEIVED",
            InvocationState::SchemaLoaded => "SCHEMA_LOADED",
            InvocationState::Validated => "VALIDATED",
            InvocationState::Marshaled => "MARSHALED",
            InvocationState::Called => "CALLED",
            InvocationState::Filtered => "FILTERED",
            InvocationState::Responded => "RESPONDED",
            InvocationState::Rejected => "REJECTED",
            InvocationState::RemoteFailed => "REMOTE_FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationState::Responded | InvocationState::Rejected | InvocationState::RemoteFailed
        )
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;

        matches!(
            (self, next),
            (Received, SchemaLoaded)
                | (Received, Rejected)
                | (SchemaLoaded, Validated)
                | (SchemaLoaded, Rejected)
                | (Validated, Marshaled)
                | (Marshaled, Called)
                | (Marshaled, RemoteFailed)
                | (Called, Filtered)
                | (Called, RemoteFailed)
                | (Filtered, Responded)
        )
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records the path a request takes through the state machine
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<InvocationState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    /// Starts in RECEIVED
    pub fn new() -> Self {
        Self {
            history: vec![InvocationState::Received],
        }
    }

    pub fn current(&self) -> InvocationState {
        self.history
            .last()
            .copied()
            .unwrap_or(InvocationState::Received)
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Internal` for a transition the machine does not allow.
    pub fn advance(&mut self, next: InvocationState) -> Result<(), GatewayError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(GatewayError::Internal(format!(
                "invalid invocation transition {} -> {}",
                current, next
            )));
        }
        self.history.push(next);
        Ok(())
    }

    /// Moves to REJECTED and hands back the error that caused it.
    pub fn reject(&mut self, err: GatewayError) -> GatewayError {
        self.fail(InvocationState::Rejected, err)
    }

    /// Moves to REMOTE_FAILED and hands back the error that caused it.
    pub fn remote_failed(&mut self, err: GatewayError) -> GatewayError {
        self.fail(InvocationState::RemoteFailed, err)
    }

    fn fail(&mut self, state: InvocationState, err: GatewayError) -> GatewayError {
        match self.advance(state) {
            Ok(()) => err,
            Err(internal) => internal,
        }
    }

    pub fn history(&self) -> &[InvocationState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<InvocationState> {
        self.history
    }
}
