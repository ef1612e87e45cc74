//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all API routes
//! - Wire up middleware (request id, tracing, CORS, request timeout)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::HttpConfig;
use crate::escrow::service::EscrowService;
use crate::http::handlers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EscrowService>,
}

/// HTTP server for the relay API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(service: Arc<EscrowService>, config: &HttpConfig) -> Self {
        let router = build_router(AppState { service }, config);
        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/transaction", post(handlers::create_transaction))
        .route("/api/transaction/{id}", get(handlers::get_transaction))
        .route("/api/transactions", get(handlers::list_transactions))
        .route("/api/verify", post(handlers::verify_transaction))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(cors_layer(&config.frontend_url))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            tracing::warn!(frontend_url = %frontend_url, "Invalid frontend origin, allowing any origin");
            AllowOrigin::any()
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
