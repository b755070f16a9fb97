//! CLI command implementations
//!
//! - serve: boot the gateway and serve HTTP until Ctrl-C
//! - validate: validate stdin parameters against one function's metadata
//! - schema: print one function's parsed metadata

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::http_server::HttpServer;
use crate::invocation::{CallRequest, ErrorResponse, GatewayError, Orchestrator};
use crate::marshal::marshal;
use crate::observability::{init_logging, log_event, Event, LogFormat};
use crate::schema::{render_function_schema, SchemaValidator};

use super::args::Command;
use super::config::GatewayConfig;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error_response, write_response};

/// Run the CLI with parsed arguments
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config, port } => serve(&config, port),
        Command::Validate { config, function } => {
            let parameters = read_request()?;
            validate(&config, &function, parameters)
        }
        Command::Schema { config, function } => schema(&config, &function),
    }
}

/// Boot the gateway and serve HTTP requests.
///
/// Boot sequence:
/// 1. Load and validate configuration
/// 2. Initialize logging
/// 3. Build the orchestrator (schema store, cache, transport)
/// 4. Bind and serve until Ctrl-C
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = GatewayConfig::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    init_logging(LogFormat::from_json_flag(config.log_json))
        .map_err(|e| CliError::boot_failed(e.to_string()))?;

    let config_display = config_path.display().to_string();
    log_event(Event::BootStart, &[("config", config_display.as_str())]);
    log_event(
        Event::ConfigLoaded,
        &[
            ("metadata_dir", config.metadata_dir.as_str()),
            ("transport", config.transport_name()),
            ("cache_schemas", if config.cache_schemas { "true" } else { "false" }),
        ],
    );

    let orchestrator = Arc::new(config.build_orchestrator());
    let server = HttpServer::new(config.http.clone(), orchestrator);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server error: {}", e)))
    })
}

/// Validate a request payload and print the marshaled call structures.
///
/// The payload is either the parameters object itself or an object
/// carrying it under `parameters`. Rejections are printed as the same
/// error payload the HTTP surface returns.
pub fn validate(config_path: &Path, function: &str, payload: Value) -> CliResult<()> {
    let config = GatewayConfig::load(config_path)?;
    let orchestrator = config.build_orchestrator();

    match validate_payload(&orchestrator, function, payload)? {
        Ok(call) => write_response(&json!({ "function_name": function, "call": call })),
        Err(err) => {
            write_error_response(&ErrorResponse::from(&err))?;
            Err(CliError::rejected(err.to_string()))
        }
    }
}

/// Print the parsed metadata of one function
pub fn schema(config_path: &Path, function: &str) -> CliResult<()> {
    let config = GatewayConfig::load(config_path)?;
    let orchestrator = config.build_orchestrator();

    let loaded = block_on(async { orchestrator.load_schema(function).await })?;
    match loaded {
        Ok(schema) => write_response(&render_function_schema(&schema)),
        Err(err) => {
            write_error_response(&ErrorResponse::from(&err))?;
            Err(CliError::rejected(err.to_string()))
        }
    }
}

/// Outer error is a CLI failure; inner error is a gateway rejection.
fn validate_payload(
    orchestrator: &Orchestrator,
    function: &str,
    payload: Value,
) -> CliResult<Result<Value, GatewayError>> {
    let parameters = match payload {
        Value::Object(mut map) if map.contains_key("parameters") => {
            map.remove("parameters").unwrap_or(Value::Null)
        }
        other => other,
    };

    let request = CallRequest::new(function, parameters);
    let parameters = match request.decoded_parameters() {
        Ok(parameters) => parameters,
        Err(err) => return Ok(Err(err)),
    };

    let schema = match block_on(async { orchestrator.load_schema(function).await })? {
        Ok(schema) => schema,
        Err(err) => return Ok(Err(err)),
    };

    let validator = SchemaValidator::new(&schema).with_policy(orchestrator.unknown_field_policy());
    let result = match validator.validate(&parameters) {
        Ok(tree) => Ok(marshal(&tree).to_value()),
        Err(violations) => Err(GatewayError::ValidationFailed {
            function: function.to_string(),
            violations,
        }),
    };
    Ok(result)
}

fn block_on<F: std::future::Future>(future: F) -> CliResult<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;
    Ok(rt.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"{
        "function_name": "Z_ECHO",
        "description": "Echo",
        "input_parameters": {
            "IV_TEXT": { "type": "CHAR", "length": 5, "required": true }
        }
    }"#;

    fn gateway(temp: &TempDir) -> Orchestrator {
        let metadata = temp.path().join("metadata");
        fs::create_dir(&metadata).unwrap();
        fs::write(metadata.join("Z_ECHO.json"), SCHEMA).unwrap();
        GatewayConfig::new(metadata.to_string_lossy()).build_orchestrator()
    }

    #[test]
    fn test_validate_payload_marshals() {
        let temp = TempDir::new().unwrap();
        let orchestrator = gateway(&temp);

        let payload = json!({ "input": { "IV_TEXT": "abc" } });
        let call = validate_payload(&orchestrator, "Z_ECHO", payload).unwrap().unwrap();
        assert_eq!(call["IV_TEXT"], json!("abc  "));
    }

    #[test]
    fn test_validate_payload_accepts_wrapped_parameters() {
        let temp = TempDir::new().unwrap();
        let orchestrator = gateway(&temp);

        let payload = json!({ "parameters": "{\"input\":{\"IV_TEXT\":\"hi\"}}" });
        let call = validate_payload(&orchestrator, "Z_ECHO", payload).unwrap().unwrap();
        assert_eq!(call["IV_TEXT"], json!("hi   "));
    }

    #[test]
    fn test_validate_payload_reports_violations() {
        let temp = TempDir::new().unwrap();
        let orchestrator = gateway(&temp);

        let payload = json!({ "input": { "IV_TEXT": "too long" } });
        let err = validate_payload(&orchestrator, "Z_ECHO", payload).unwrap().unwrap_err();
        assert_eq!(err.code(), "GW_VALIDATION_FAILED");
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_validate_payload_unknown_function() {
        let temp = TempDir::new().unwrap();
        let orchestrator = gateway(&temp);

        let err = validate_payload(&orchestrator, "Z_MISSING", json!({}))
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), "GW_SCHEMA_NOT_FOUND");
    }
}
