//! Invocation subsystem
//!
//! Takes a gateway call request through the invocation state machine:
//! schema load, validation, marshaling, the remote call and response
//! projection. Validation failures are resolved locally; remote and
//! transport failures are surfaced, never swallowed and never retried.

mod errors;
mod orchestrator;
mod state;
mod transport;

pub use errors::{ErrorDetail, ErrorResponse, GatewayError, GatewayResult};
pub use orchestrator::{
    CallRequest, CallResponse, CallStatus, InvocationLimits, InvocationOutcome, Orchestrator,
    SUCCESS_MESSAGE,
};
pub use state::{InvocationState, StateTracker};
pub use transport::{FixtureTransport, RemoteTransport, TransportError, UnavailableTransport};
