//! JSON I/O handling for CLI
//!
//! - Input: one JSON document on stdin
//! - Output: one JSON object on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde::Serialize;
use serde_json::Value;

use crate::invocation::ErrorResponse;

use super::errors::{CliError, CliResult};

/// Read a JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Parse a JSON document; empty input is an error
pub fn parse_request(input: &str) -> CliResult<Value> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(input)?;
    Ok(value)
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_value(&response)
}

/// Write a structured gateway error to stdout
pub fn write_error_response(error: &ErrorResponse) -> CliResult<()> {
    write_value(error)
}

fn write_value<T: Serialize>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
