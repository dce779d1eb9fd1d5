//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use axum::Router;
use futures_util::future::BoxFuture;
use rr_proxy::{Backend, Balancer, ForwardError, HttpServer, ProxyConfig, Shutdown};
use tokio::net::TcpListener;
use url::Url;

/// A request as observed by a mock backend.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Requests seen by one mock backend, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Recorded>>>);

#[allow(dead_code)]
impl Recorder {
    pub fn requests(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a backend that records every request and answers `200` with its
/// name in both the body and an `x-served-by` header.
pub async fn start_recording_backend(name: &'static str) -> (SocketAddr, Recorder) {
    let recorder = Recorder::default();
    let seen = recorder.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let seen = seen.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            seen.0.lock().unwrap().push(Recorded {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            });
            (StatusCode::OK, [("x-served-by", name)], name)
        }
    });

    (spawn_app(app).await, recorder)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy in front of `backends`, letting the caller adjust config.
pub async fn start_proxy<F>(backends: &[SocketAddr], configure: F) -> (SocketAddr, Shutdown)
where
    F: FnOnce(&mut ProxyConfig),
{
    let mut config = ProxyConfig::default();
    config.backends = backends
        .iter()
        .map(|addr| format!("http://{}", addr).into())
        .collect();
    configure(&mut config);

    let server = HttpServer::new(&config).unwrap();
    serve(server).await
}

/// Start the proxy around a hand-built balancer.
#[allow(dead_code)]
pub async fn start_proxy_with(balancer: Balancer) -> (SocketAddr, Shutdown) {
    serve(HttpServer::with_balancer(Arc::new(balancer))).await
}

async fn serve(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// In-memory backend with a fixed liveness answer.
#[derive(Debug)]
#[allow(dead_code)]
pub struct FixedBackend {
    address: Url,
    alive: bool,
}

#[allow(dead_code)]
impl FixedBackend {
    pub fn new(address: &str, alive: bool) -> Arc<dyn Backend> {
        Arc::new(Self {
            address: Url::parse(address).unwrap(),
            alive,
        })
    }
}

impl Backend for FixedBackend {
    fn address(&self) -> &Url {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn forward(&self, _request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>> {
        let body = self.address.host_str().unwrap_or_default().to_string();
        Box::pin(async move { Ok(Response::new(Body::from(body))) })
    }
}
