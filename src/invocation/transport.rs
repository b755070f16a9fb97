//! Remote transport seam
//!
//! The transport carries marshaled call structures to the remote system and
//! returns its raw result. It owns connection handling and any retry
//! policy; the orchestrator never retries.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::marshal::CallStructures;
use crate::schema::is_valid_function_name;
use crate::BoxFuture;

/// Transport-level failures, distinct from logical failures reported by the
/// remote system through RETURN
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No answer within the configured limit
    #[error("remote call timed out after {0} ms")]
    Timeout(u64),

    /// Backend unreachable or not configured
    #[error("remote system unavailable: {0}")]
    Unavailable(String),

    /// The call could not be completed
    #[error("remote call failed: {0}")]
    Failed(String),
}

impl TransportError {
    /// Whether a caller may reasonably retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout(_) | TransportError::Unavailable(_))
    }
}

/// Invokes remote functions
pub trait RemoteTransport: Send + Sync {
    /// Calls `function_name` with the given structures and returns the raw
    /// result object.
    fn invoke<'a>(
        &'a self,
        function_name: &'a str,
        call: &'a CallStructures,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;
}

impl<T: RemoteTransport + ?Sized> RemoteTransport for Arc<T> {
    fn invoke<'a>(
        &'a self,
        function_name: &'a str,
        call: &'a CallStructures,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        (**self).invoke(function_name, call)
    }
}

/// Replays canned raw results from `<root>/<FUNCTION>.json`
///
/// Used for demos and local development; the call structures are logged
/// and otherwise ignored.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    root: PathBuf,
}

impl FixtureTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn replay(&self, function_name: &str, call: &CallStructures) -> Result<Value, TransportError> {
        if !is_valid_function_name(function_name) {
            return Err(TransportError::Failed(format!(
                "Function module {} not found",
                function_name
            )));
        }

        let path = self.root.join(format!("{}.json", function_name));
        debug!(
            function = function_name,
            fixture = %path.display(),
            parameters = call.parameters.len(),
            tables = call.tables.len(),
            "replaying fixture"
        );

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransportError::Failed(format!(
                    "Function module {} not found",
                    function_name
                )));
            }
            Err(e) => {
                return Err(TransportError::Unavailable(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        serde_json::from_str(text)
            .map_err(|e| TransportError::Failed(format!("fixture {} is not valid JSON: {}", path.display(), e)))
    }
}

impl RemoteTransport for FixtureTransport {
    fn invoke<'a>(
        &'a self,
        function_name: &'a str,
        call: &'a CallStructures,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(self.replay(function_name, call))
    }
}

/// Rejects every call; used when no backend is configured
#[derive(Debug, Clone, Default)]
pub struct UnavailableTransport;

impl RemoteTransport for UnavailableTransport {
    fn invoke<'a>(
        &'a self,
        _function_name: &'a str,
        _call: &'a CallStructures,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async {
            Err(TransportError::Unavailable(
                "no remote backend configured".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fixture_replay() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("BAPI_X.json"),
            r#"{"RETURN":{"TYPE":"S","MESSAGE":"ok"}}"#,
        )
        .unwrap();

        let transport = FixtureTransport::new(dir.path());
        let raw = transport.invoke("BAPI_X", &CallStructures::new()).await.unwrap();
        assert_eq!(raw, json!({ "RETURN": { "TYPE": "S", "MESSAGE": "ok" } }));
    }

    #[tokio::test]
    async fn test_fixture_missing_function() {
        let dir = TempDir::new().unwrap();
        let transport = FixtureTransport::new(dir.path());

        let err = transport.invoke("BAPI_NONE", &CallStructures::new()).await.unwrap_err();
        assert_eq!(err, TransportError::Failed("Function module BAPI_NONE not found".to_string()));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unavailable_transport() {
        let err = UnavailableTransport
            .invoke("BAPI_X", &CallStructures::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(TransportError::Timeout(250).to_string(), "remote call timed out after 250 ms");
    }
}
