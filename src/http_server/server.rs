//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::invocation::Orchestrator;
use crate::observability::{log_event, Event};

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::sap_routes::{sap_routes, SapState, API_PREFIX};

/// HTTP Server for the gateway
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving the given orchestrator
    pub fn new(config: HttpServerConfig, orchestrator: Arc<Orchestrator>) -> Self {
        let router = Self::build_router(&config, orchestrator);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, orchestrator: Arc<Orchestrator>) -> Router {
        let metrics = Arc::clone(orchestrator.metrics());
        let sap_state = Arc::new(SapState::new(orchestrator));

        // Configure CORS from config
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            // Health check at root level
            .merge(health_routes())
            // Gateway routes under /api/v1/sap
            .merge(sap_routes(sap_state))
            // Observability routes under /observability
            .nest("/observability", observability_routes(metrics))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server; returns after Ctrl-C.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;

        log_event(Event::Serving, &[("addr", addr.as_str()), ("api", API_PREFIX)]);
        info!("Health check: http://{}/health", addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete, &[]);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
