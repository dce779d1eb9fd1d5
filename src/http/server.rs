//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{RequestSpan, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::startup::build_balancer;
use crate::load_balancer::{Balancer, BalancerError};

/// HTTP front end of the proxy.
pub struct HttpServer {
    router: Router,
    balancer: Arc<Balancer>,
}

impl HttpServer {
    /// Build backends and balancer from configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, BalancerError> {
        let balancer = build_balancer(config)?;
        Ok(Self::with_balancer(Arc::new(balancer)))
    }

    /// Serve an already constructed balancer.
    pub fn with_balancer(balancer: Arc<Balancer>) -> Self {
        let router = Self::build_router(balancer.clone());
        Self { router, balancer }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(balancer: Arc<Balancer>) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(balancer)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            port = self.balancer.port(),
            backends = self.balancer.backends().len(),
            "Serving requests"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every method and path goes to the balancer.
async fn proxy_handler(
    State(balancer): State<Arc<Balancer>>,
    request: Request<Body>,
) -> Result<Response<Body>, BalancerError> {
    balancer.serve(request).await
}
