//! Gateway HTTP Routes
//!
//! Endpoints for remote function calls, table reads and metadata lookup.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::invocation::{CallRequest, CallResponse, GatewayError, GatewayResult, Orchestrator};
use crate::read_table::{read_table, ReadTableRequest, ReadTableResponse};
use crate::schema::{render_function_schema, FunctionSchema};

/// Route prefix of the gateway API
pub const API_PREFIX: &str = "/api/v1/sap";

// ==================
// Shared State
// ==================

/// Gateway state shared across handlers
pub struct SapState {
    pub orchestrator: Arc<Orchestrator>,
}

impl SapState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: String,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Parsed metadata of one function
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub status: &'static str,
    pub function_name: String,
    pub metadata: Value,
}

impl MetadataResponse {
    fn new(schema: &FunctionSchema) -> Self {
        Self {
            status: "success",
            function_name: schema.function_name.clone(),
            metadata: render_function_schema(schema),
        }
    }
}

fn api_info() -> ApiInfoResponse {
    let endpoint = |method, suffix: &str, description| EndpointInfo {
        method,
        path: format!("{}{}", API_PREFIX, suffix),
        description,
    };

    ApiInfoResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            endpoint("POST", "/call-function", "Validate and execute a remote function"),
            endpoint("POST", "/read-table", "Read rows of a backend table"),
            endpoint("GET", "/functions/{name}/metadata", "Show the metadata of a function"),
            endpoint("GET", "/", "This listing"),
        ],
    }
}

// ==================
// Routes
// ==================

/// Create gateway routes under [`API_PREFIX`]
pub fn sap_routes(state: Arc<SapState>) -> Router {
    Router::new()
        .route(API_PREFIX, get(api_info_handler))
        .route(&format!("{}/", API_PREFIX), get(api_info_handler))
        .route(&format!("{}/call-function", API_PREFIX), post(call_function_handler))
        .route(&format!("{}/read-table", API_PREFIX), post(read_table_handler))
        .route(
            &format!("{}/functions/:name/metadata", API_PREFIX),
            get(metadata_handler),
        )
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn api_info_handler() -> Json<ApiInfoResponse> {
    Json(api_info())
}

async fn call_function_handler(
    State(state): State<Arc<SapState>>,
    payload: Result<Json<CallRequest>, JsonRejection>,
) -> GatewayResult<Json<CallResponse>> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let response = state.orchestrator.call(&request).await?;
    Ok(Json(response))
}

async fn read_table_handler(
    State(state): State<Arc<SapState>>,
    payload: Result<Json<ReadTableRequest>, JsonRejection>,
) -> GatewayResult<Json<ReadTableResponse>> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let response = read_table(&state.orchestrator, &request).await?;
    Ok(Json(response))
}

async fn metadata_handler(
    State(state): State<Arc<SapState>>,
    Path(name): Path<String>,
) -> GatewayResult<Json<MetadataResponse>> {
    let schema = state.orchestrator.load_schema(&name).await?;
    Ok(Json(MetadataResponse::new(&schema)))
}
