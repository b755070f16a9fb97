//! Log subscriber setup
//!
//! Records go to stdout, one line per event. The filter is read from
//! `RFCGATE_LOG` (same syntax as `RUST_LOG`) and defaults to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::{ObservabilityError, ObservabilityResult};

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "RFCGATE_LOG";

/// Output format of log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line records
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Builds the filter from `RFCGATE_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(format: LogFormat) -> ObservabilityResult<()> {
    let filter = env_filter("info");

    let result = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init(),
    };

    result.map_err(|e| ObservabilityError::new(format!("failed to install log subscriber: {}", e)))
}
