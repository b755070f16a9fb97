//! Response handling
//!
//! Projection of raw remote results onto the declared output shape, and
//! interpretation of the remote system's RETURN messages.

mod filter;
mod returns;

pub use filter::{filter, FilteredResult};
pub use returns::{
    first_failure, return_messages, ReturnMessage, FAILURE_TYPES, RETURN_PARAMETER,
};
