//! rfcgate - A metadata-driven REST gateway for remote business-function calls
//!
//! Every remote function is described by a JSON metadata document. The
//! gateway validates caller payloads against that metadata, marshals them
//! into the fixed-format call structures the backend expects, invokes the
//! remote function and shapes the raw result back down to the declared
//! output parameters.

use std::future::Future;
use std::pin::Pin;

pub mod cli;
pub mod coercion;
pub mod http_server;
pub mod invocation;
pub mod marshal;
pub mod observability;
pub mod read_table;
pub mod response;
pub mod schema;

/// Boxed future returned by the object-safe collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
