//! # Gateway HTTP Server Module
//!
//! Combines all endpoint routers into a single axum server.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/v1/sap/*` - Function calls, table reads, metadata
//! - `/observability/*` - Metrics and monitoring

pub mod config;
pub mod observability_routes;
pub mod sap_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use sap_routes::{SapState, API_PREFIX};
pub use server::HttpServer;
