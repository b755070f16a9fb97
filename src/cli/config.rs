//! Gateway configuration file
//!
//! Loaded once at startup. Every field except `metadata_dir` has a default.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::invocation::{
    FixtureTransport, InvocationLimits, Orchestrator, RemoteTransport, UnavailableTransport,
};
use crate::observability::MetricsRegistry;
use crate::schema::{CachedSchemaProvider, FileSchemaStore, SchemaProvider, UnknownFieldPolicy};

use super::errors::{CliError, CliResult};

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Directory holding one `<FUNCTION>.json` metadata file per function
    pub metadata_dir: String,

    #[serde(default = "default_schema_load_timeout_ms")]
    pub schema_load_timeout_ms: u64,

    #[serde(default = "default_remote_call_timeout_ms")]
    pub remote_call_timeout_ms: u64,

    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,

    #[serde(default = "default_cache_schemas")]
    pub cache_schemas: bool,

    /// Directory of canned remote responses; no backend when absent
    #[serde(default)]
    pub fixtures_dir: Option<String>,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_schema_load_timeout_ms() -> u64 {
    5_000
}

fn default_remote_call_timeout_ms() -> u64 {
    30_000
}

fn default_cache_schemas() -> bool {
    true
}

impl GatewayConfig {
    /// Config with defaults for everything but the metadata directory
    pub fn new(metadata_dir: impl Into<String>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
            schema_load_timeout_ms: default_schema_load_timeout_ms(),
            remote_call_timeout_ms: default_remote_call_timeout_ms(),
            unknown_fields: UnknownFieldPolicy::default(),
            cache_schemas: default_cache_schemas(),
            fixtures_dir: None,
            log_json: false,
            http: HttpServerConfig::default(),
        }
    }

    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let config: GatewayConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> CliResult<()> {
        if self.metadata_dir.trim().is_empty() {
            return Err(CliError::config_error("metadata_dir must not be empty"));
        }
        if !Path::new(&self.metadata_dir).is_dir() {
            return Err(CliError::config_error(format!(
                "metadata_dir '{}' is not a directory",
                self.metadata_dir
            )));
        }
        if self.schema_load_timeout_ms == 0 {
            return Err(CliError::config_error("schema_load_timeout_ms must be > 0"));
        }
        if self.remote_call_timeout_ms == 0 {
            return Err(CliError::config_error("remote_call_timeout_ms must be > 0"));
        }
        if let Some(dir) = &self.fixtures_dir {
            if !Path::new(dir).is_dir() {
                return Err(CliError::config_error(format!(
                    "fixtures_dir '{}' is not a directory",
                    dir
                )));
            }
        }
        Ok(())
    }

    pub fn limits(&self) -> InvocationLimits {
        InvocationLimits {
            schema_load_timeout: Duration::from_millis(self.schema_load_timeout_ms),
            remote_call_timeout: Duration::from_millis(self.remote_call_timeout_ms),
        }
    }

    /// Name of the configured backend, for startup logging
    pub fn transport_name(&self) -> &'static str {
        if self.fixtures_dir.is_some() {
            "fixture"
        } else {
            "unavailable"
        }
    }

    /// Wire the schema store, transport and limits into an orchestrator
    pub fn build_orchestrator(&self) -> Orchestrator {
        let metrics = Arc::new(MetricsRegistry::new());
        let store = FileSchemaStore::new(&self.metadata_dir);

        let provider: Arc<dyn SchemaProvider> = if self.cache_schemas {
            Arc::new(CachedSchemaProvider::new(store).with_metrics(Arc::clone(&metrics)))
        } else {
            Arc::new(store)
        };

        let transport: Arc<dyn RemoteTransport> = match &self.fixtures_dir {
            Some(dir) => Arc::new(FixtureTransport::new(dir)),
            None => Arc::new(UnavailableTransport),
        };

        Orchestrator::new(provider, transport)
            .with_limits(self.limits())
            .with_unknown_field_policy(self.unknown_fields)
            .with_metrics(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("rfcgate.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp = TempDir::new().unwrap();
        let metadata = temp.path().join("metadata");
        fs::create_dir(&metadata).unwrap();

        let body = serde_json::json!({ "metadata_dir": metadata }).to_string();
        let config = GatewayConfig::load(&write_config(&temp, &body)).unwrap();

        assert_eq!(config.schema_load_timeout_ms, 5_000);
        assert_eq!(config.remote_call_timeout_ms, 30_000);
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Ignore);
        assert!(config.cache_schemas);
        assert!(!config.log_json);
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.transport_name(), "unavailable");
    }

    #[test]
    fn test_load_reads_overrides() {
        let temp = TempDir::new().unwrap();
        let metadata = temp.path().join("metadata");
        fs::create_dir(&metadata).unwrap();

        let body = serde_json::json!({
            "metadata_dir": metadata,
            "remote_call_timeout_ms": 250,
            "unknown_fields": "reject",
            "http": { "port": 9100 }
        })
        .to_string();
        let config = GatewayConfig::load(&write_config(&temp, &body)).unwrap();

        assert_eq!(config.limits().remote_call_timeout, Duration::from_millis(250));
        assert_eq!(config.unknown_fields, UnknownFieldPolicy::Reject);
        assert_eq!(config.http.port, 9100);
        assert_eq!(config.http.host, "0.0.0.0");
    }

    #[test]
    fn test_missing_metadata_dir_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "{}");
        let err = GatewayConfig::load(&path).unwrap_err();
        assert_eq!(err.code_str(), "GW_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp = TempDir::new().unwrap();
        let mut config = GatewayConfig::new(temp.path().to_string_lossy());
        config.schema_load_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nonexistent_directories_rejected() {
        let temp = TempDir::new().unwrap();
        let config = GatewayConfig::new(temp.path().join("nope").to_string_lossy());
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::new(temp.path().to_string_lossy());
        config.fixtures_dir = Some(temp.path().join("nope").to_string_lossy().into_owned());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = GatewayConfig::load(Path::new("/nonexistent/rfcgate.json")).unwrap_err();
        assert!(err.message().contains("Failed to read config file"));
    }
}
