//! HTTP surface tests
//!
//! Sends requests through the full router against the shipped metadata
//! and fixtures, checking status codes and payload shapes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use rfcgate::http_server::{HttpServer, HttpServerConfig};
use rfcgate::invocation::{FixtureTransport, Orchestrator, UnavailableTransport};
use rfcgate::schema::{CachedSchemaProvider, FileSchemaStore, UnknownFieldPolicy};

fn repo_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn router_with(orchestrator: Orchestrator) -> Router {
    HttpServer::new(HttpServerConfig::default(), Arc::new(orchestrator)).router()
}

fn fixture_router() -> Router {
    router_with(Orchestrator::new(
        Arc::new(CachedSchemaProvider::new(FileSchemaStore::new(repo_dir("metadata")))),
        Arc::new(FixtureTransport::new(repo_dir("fixtures"))),
    ))
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn order_request() -> Value {
    json!({
        "function_name": "BAPI_SALESORDER_CREATEFROMDAT2",
        "parameters": {
            "input": {
                "ORDER_HEADER_IN": {
                    "DOC_TYPE": "TA",
                    "SALES_ORG": "1000",
                    "DISTR_CHAN": "10",
                    "DIVISION": "00",
                    "REQ_DATE_H": "15.04.2024"
                }
            },
            "tables": {
                "ORDER_ITEMS_IN": [{ "ITM_NUMBER": "10", "MATERIAL": "MAT-100", "TARGET_QTY": "2" }],
                "ORDER_PARTNERS": [{ "PARTN_ROLE": "AG", "PARTN_NUMB": "1000" }]
            }
        }
    })
}

// =============================================================================
// HEALTH AND DISCOVERY
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send(fixture_router(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_info_lists_endpoints() {
    let (status, body) = send(fixture_router(), Method::GET, "/api/v1/sap", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "rfcgate");
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_function_metadata() {
    let (status, body) = send(
        fixture_router(),
        Method::GET,
        "/api/v1/sap/functions/BAPI_SALESORDER_CREATEFROMDAT2/metadata",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["function_name"], "BAPI_SALESORDER_CREATEFROMDAT2");

    let metadata = &body["metadata"];
    assert_eq!(metadata["function_name"], "BAPI_SALESORDER_CREATEFROMDAT2");
    assert_eq!(
        metadata["input_parameters"]["ORDER_HEADER_IN"]["DOC_TYPE"]["type"],
        "CHAR"
    );
    assert_eq!(metadata["table_parameters"]["ORDER_ITEMS_IN"]["min_rows"], 1);
}

#[tokio::test]
async fn test_unknown_function_metadata_is_404() {
    let (status, body) = send(
        fixture_router(),
        Method::GET,
        "/api/v1/sap/functions/Z_UNKNOWN/metadata",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"]["error"], "GW_SCHEMA_NOT_FOUND");
}

// =============================================================================
// CALL FUNCTION
// =============================================================================

#[tokio::test]
async fn test_call_function_success() {
    let (status, body) = send(
        fixture_router(),
        Method::POST,
        "/api/v1/sap/call-function",
        Some(order_request()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Execution completed successfully.");
    assert_eq!(body["sap_response"]["SALESDOCUMENT"], "0000012345");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_call_function_validation_error() {
    let mut request = order_request();
    request["parameters"]["input"]["ORDER_HEADER_IN"]["REQ_DATE_H"] = json!("31.02.2024");
    request["parameters"]["tables"]["ORDER_ITEMS_IN"][0]["TARGET_QU"] = json!("pc");

    let (status, body) = send(
        fixture_router(),
        Method::POST,
        "/api/v1/sap/call-function",
        Some(request),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = &body["detail"];
    assert_eq!(detail["error"], "GW_VALIDATION_FAILED");
    assert_eq!(detail["type"], "validation_error");
    assert!(detail["timestamp"].as_str().unwrap().ends_with('Z'));

    let fields: Vec<&str> = detail["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        fields,
        vec!["ORDER_HEADER_IN.REQ_DATE_H", "ORDER_ITEMS_IN[0].TARGET_QU"]
    );
}

#[tokio::test]
async fn test_call_function_rejects_unknown_fields_when_configured() {
    let orchestrator = Orchestrator::new(
        Arc::new(FileSchemaStore::new(repo_dir("metadata"))),
        Arc::new(FixtureTransport::new(repo_dir("fixtures"))),
    )
    .with_unknown_field_policy(UnknownFieldPolicy::Reject);

    let mut request = order_request();
    request["parameters"]["input"]["ORDER_HEADER_IN"]["SHIP_COND"] = json!("01");

    let (status, body) = send(
        router_with(orchestrator),
        Method::POST,
        "/api/v1/sap/call-function",
        Some(request),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"]["violations"][0]["reason"], "UNKNOWN_FIELD");
}

#[tokio::test]
async fn test_call_function_malformed_body() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/sap/call-function")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = fixture_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"]["error"], "GW_INVALID_REQUEST");
}

#[tokio::test]
async fn test_call_function_without_backend_is_bad_gateway() {
    let router = router_with(Orchestrator::new(
        Arc::new(FileSchemaStore::new(repo_dir("metadata"))),
        Arc::new(UnavailableTransport),
    ));

    let (status, body) = send(router, Method::POST, "/api/v1/sap/call-function", Some(order_request())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"]["error"], "GW_TRANSPORT_ERROR");
    assert_eq!(body["detail"]["type"], "remote_error");
}

// =============================================================================
// READ TABLE
// =============================================================================

#[tokio::test]
async fn test_read_table() {
    let (status, body) = send(
        fixture_router(),
        Method::POST,
        "/api/v1/sap/read-table",
        Some(json!({
            "table": "LIKP",
            "fields": ["VBELN", "ERDAT", "VSTEL"],
            "condition_key": "0080000001"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["record_found"], true);

    let records = body["data"]["DATA"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["VBELN"], "0080000001");
    assert_eq!(records[0]["ERDAT"], "20240115");
    assert_eq!(records[1]["VSTEL"], "SHIP01");
}

#[tokio::test]
async fn test_read_table_invalid_name() {
    let (status, body) = send(
        fixture_router(),
        Method::POST,
        "/api/v1/sap/read-table",
        Some(json!({ "table": "LIKP; DROP" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"]["error"], "GW_INVALID_REQUEST");
}

// =============================================================================
// OBSERVABILITY
// =============================================================================

#[tokio::test]
async fn test_metrics_count_requests() {
    let router = fixture_router();

    let (status, _) = send(
        router.clone(),
        Method::POST,
        "/api/v1/sap/call-function",
        Some(order_request()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, Method::GET, "/observability/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests_received"], 1);
    assert_eq!(body["calls_succeeded"], 1);
}
