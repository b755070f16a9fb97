//! Invocation orchestrator
//!
//! Drives one call request through load, validate, marshal, call, filter.
//! The orchestrator holds no per-request state between calls and never
//! retries. Its only suspension points are the schema load and the remote
//! call, both bounded by [`InvocationLimits`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::marshal::{marshal, CallStructures};
use crate::observability::{Event, MetricsRegistry};
use crate::response::{filter, first_failure, FilteredResult};
use crate::schema::{FunctionSchema, SchemaError, SchemaProvider, SchemaValidator, UnknownFieldPolicy};

use super::errors::{GatewayError, GatewayResult};
use super::state::{InvocationState, StateTracker};
use super::transport::{RemoteTransport, TransportError};

/// Message returned when the remote call reports no failure
pub const SUCCESS_MESSAGE: &str = "Execution completed successfully.";

/// Bounds on the two external calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationLimits {
    pub schema_load_timeout: Duration,
    pub remote_call_timeout: Duration,
}

impl Default for InvocationLimits {
    fn default() -> Self {
        Self {
            schema_load_timeout: Duration::from_millis(5_000),
            remote_call_timeout: Duration::from_millis(30_000),
        }
    }
}

/// Gateway-facing call request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub function_name: String,
    /// `{ "input": {...}, "tables": {...} }`, or the same object encoded as
    /// a JSON string
    #[serde(default)]
    pub parameters: Value,
}

impl CallRequest {
    pub fn new(function_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            function_name: function_name.into(),
            parameters,
        }
    }

    /// Decoded parameters; string-encoded JSON is parsed.
    pub fn decoded_parameters(&self) -> GatewayResult<Value> {
        match &self.parameters {
            Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
            Value::String(text) => serde_json::from_str(text).map_err(|e| {
                GatewayError::InvalidRequest(format!("parameters is not valid JSON: {}", e))
            }),
            other => Ok(other.clone()),
        }
    }
}

/// Outcome status reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Error,
}

/// Gateway-facing call response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    pub status: CallStatus,
    pub message: String,
    pub sap_response: Option<FilteredResult>,
    /// Error code when `status` is `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallResponse {
    pub fn success(response: FilteredResult) -> Self {
        Self {
            status: CallStatus::Success,
            message: SUCCESS_MESSAGE.to_string(),
            sap_response: Some(response),
            error: None,
        }
    }

    pub fn remote_failure(message: impl Into<String>, response: FilteredResult) -> Self {
        Self {
            status: CallStatus::Error,
            message: message.into(),
            sap_response: Some(response),
            error: Some("GW_REMOTE_INVOCATION_FAILED".to_string()),
        }
    }
}

/// Everything that happened to one request
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub request_id: Uuid,
    pub function_name: String,
    /// States visited, starting at RECEIVED and ending in a terminal state
    pub states: Vec<InvocationState>,
    pub duration: Duration,
    pub result: GatewayResult<FilteredResult>,
}

impl InvocationOutcome {
    pub fn final_state(&self) -> Option<InvocationState> {
        self.states.last().copied()
    }

    /// Converts to the gateway-facing response.
    ///
    /// Logical remote failures become an `error` response carrying the
    /// projected result; every other failure stays an error.
    pub fn into_call_response(self) -> GatewayResult<CallResponse> {
        match self.result {
            Ok(filtered) => Ok(CallResponse::success(filtered)),
            Err(GatewayError::RemoteInvocationFailed { message, response, .. }) => {
                Ok(CallResponse::remote_failure(message, response))
            }
            Err(err) => Err(err),
        }
    }
}

/// Executes call requests against a schema provider and a transport
pub struct Orchestrator {
    provider: Arc<dyn SchemaProvider>,
    transport: Arc<dyn RemoteTransport>,
    limits: InvocationLimits,
    policy: UnknownFieldPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn SchemaProvider>, transport: Arc<dyn RemoteTransport>) -> Self {
        Self {
            provider,
            transport,
            limits: InvocationLimits::default(),
            policy: UnknownFieldPolicy::default(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_limits(mut self, limits: InvocationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_unknown_field_policy(mut self, policy: UnknownFieldPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn limits(&self) -> InvocationLimits {
        self.limits
    }

    pub fn unknown_field_policy(&self) -> UnknownFieldPolicy {
        self.policy
    }

    /// Loads a schema within the configured time limit.
    pub async fn load_schema(&self, function_name: &str) -> GatewayResult<Arc<FunctionSchema>> {
        let timeout = self.limits.schema_load_timeout;
        let loaded = match tokio::time::timeout(timeout, self.provider.load_schema(function_name)).await {
            Ok(result) => result,
            Err(_) => Err(SchemaError::load_failed(
                function_name,
                format!("metadata load timed out after {} ms", timeout.as_millis()),
            )),
        };

        match loaded {
            Ok(schema) => {
                self.metrics.increment_schema_loads();
                debug!(event = Event::SchemaLoaded.as_str(), function = function_name);
                Ok(schema)
            }
            Err(err) => {
                self.metrics.increment_schema_failures();
                warn!(
                    event = Event::SchemaLoadFailed.as_str(),
                    function = function_name,
                    code = err.code().code(),
                    error = %err
                );
                Err(err.into())
            }
        }
    }

    /// Calls the transport within the configured time limit.
    pub async fn invoke_raw(&self, function_name: &str, call: &CallStructures) -> GatewayResult<Value> {
        let timeout = self.limits.remote_call_timeout;
        let result = match tokio::time::timeout(timeout, self.transport.invoke(function_name, call)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
        };

        result.map_err(|source| {
            self.metrics.increment_transport_failures();
            warn!(
                event = Event::TransportFailed.as_str(),
                function = function_name,
                retryable = source.is_retryable(),
                error = %source
            );
            GatewayError::Transport {
                function: function_name.to_string(),
                source,
            }
        })
    }

    /// Runs one request to a terminal state.
    pub async fn execute(&self, request: &CallRequest) -> InvocationOutcome {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let mut tracker = StateTracker::new();

        self.metrics.increment_requests_received();
        info!(
            event = Event::RequestReceived.as_str(),
            request_id = %request_id,
            function = %request.function_name
        );

        let result = self.run(request, request_id, &mut tracker).await;
        let duration = started.elapsed();

        if tracker.current() == InvocationState::Rejected {
            self.metrics.increment_requests_rejected();
        }

        match &result {
            Ok(_) => info!(
                event = Event::Responded.as_str(),
                request_id = %request_id,
                function = %request.function_name,
                duration_ms = duration.as_millis() as u64
            ),
            Err(err) => debug!(
                request_id = %request_id,
                function = %request.function_name,
                state = tracker.current().as_str(),
                code = err.code(),
                duration_ms = duration.as_millis() as u64,
                "request finished with error"
            ),
        }

        InvocationOutcome {
            request_id,
            function_name: request.function_name.clone(),
            states: tracker.into_history(),
            duration,
            result,
        }
    }

    /// Runs one request and converts the outcome to the gateway response.
    pub async fn call(&self, request: &CallRequest) -> GatewayResult<CallResponse> {
        self.execute(request).await.into_call_response()
    }

    async fn run(
        &self,
        request: &CallRequest,
        request_id: Uuid,
        tracker: &mut StateTracker,
    ) -> GatewayResult<FilteredResult> {
        let function = request.function_name.as_str();

        if function.trim().is_empty() {
            return Err(tracker.reject(GatewayError::InvalidRequest(
                "function_name must not be empty".to_string(),
            )));
        }

        let parameters = match request.decoded_parameters() {
            Ok(parameters) => parameters,
            Err(err) => return Err(tracker.reject(err)),
        };

        // RECEIVED -> SCHEMA_LOADED
        let schema = match self.load_schema(function).await {
            Ok(schema) => schema,
            Err(err) => return Err(tracker.reject(err)),
        };
        tracker.advance(InvocationState::SchemaLoaded)?;

        // SCHEMA_LOADED -> VALIDATED -> MARSHALED
        let call = {
            let validator = SchemaValidator::new(&schema).with_policy(self.policy);
            let validated = match validator.validate(&parameters) {
                Ok(validated) => validated,
                Err(violations) => {
                    warn!(
                        event = Event::ValidationRejected.as_str(),
                        request_id = %request_id,
                        function,
                        violations = violations.len(),
                        summary = %violations
                    );
                    return Err(tracker.reject(GatewayError::ValidationFailed {
                        function: function.to_string(),
                        violations,
                    }));
                }
            };
            tracker.advance(InvocationState::Validated)?;

            let call = marshal(&validated);
            tracker.advance(InvocationState::Marshaled)?;
            call
        };

        // MARSHALED -> CALLED
        info!(
            event = Event::RemoteCallStarted.as_str(),
            request_id = %request_id,
            function,
            parameters = call.parameters.len(),
            tables = call.tables.len()
        );
        let raw = match self.invoke_raw(function, &call).await {
            Ok(raw) => raw,
            Err(err) => return Err(tracker.remote_failed(err)),
        };
        tracker.advance(InvocationState::Called)?;

        let filtered = filter(&raw, &schema.output_parameters);

        if let Some(failure) = first_failure(&raw) {
            self.metrics.increment_calls_failed();
            let message = if failure.message.is_empty() {
                format!(
                    "{} reported message type {} without text",
                    function, failure.message_type
                )
            } else {
                failure.message
            };
            warn!(
                event = Event::RemoteCallFailed.as_str(),
                request_id = %request_id,
                function,
                message_type = %failure.message_type,
                message = %message
            );
            return Err(tracker.remote_failed(GatewayError::RemoteInvocationFailed {
                function: function.to_string(),
                message,
                response: filtered,
            }));
        }

        // CALLED -> FILTERED -> RESPONDED
        tracker.advance(InvocationState::Filtered)?;
        self.metrics.increment_calls_succeeded();
        info!(
            event = Event::RemoteCallSucceeded.as_str(),
            request_id = %request_id,
            function
        );
        tracker.advance(InvocationState::Responded)?;

        Ok(filtered)
    }
}
