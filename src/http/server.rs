//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router dispatching every path to the caching handler
//! - Wire up middleware (timeout, request ID, access log)
//! - Bind server to listener
//! - Graceful shutdown on the lifecycle broadcast

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::cache::CachingHandler;
use crate::config::ProxyConfig;
use crate::http::request::{access_log, RequestIdGenerator};
use crate::lifecycle::stopped;
use crate::store::StoreError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<CachingHandler>,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, StoreError> {
        let handler = CachingHandler::new(&config)?;
        Ok(Self::with_handler(config, handler))
    }

    /// Create a server around an already-built handler.
    pub fn with_handler(config: ProxyConfig, handler: CachingHandler) -> Self {
        let state = AppState {
            handler: Arc::new(handler),
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A request still waiting on the origin or the store when the deadline
    /// passes is answered with 504.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*target}", any(cache_handler))
            .route("/", any(cache_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(access_log))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// The router, for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            bucket = %self.config.store.bucket,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stopped(shutdown).await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Dispatch to the cache-aside handler.
async fn cache_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.handler.handle(request).await
}
