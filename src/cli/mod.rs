//! CLI module for rfcgate
//!
//! Provides command-line interface for:
//! - serve: Boot the gateway and serve HTTP
//! - validate: One-shot request validation and marshaling
//! - schema: Print parsed function metadata

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command, schema, serve, validate};
pub use config::GatewayConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error_response, write_response};
