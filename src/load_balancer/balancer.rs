//! Backend pool and request dispatch.
//!
//! # Responsibilities
//! - Own the fixed, ordered backend roster
//! - Apply round-robin selection to pick a backend per request
//! - Delegate forwarding to the chosen backend

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::load_balancer::{
    backend::Backend,
    error::BalancerError,
    round_robin::RoundRobin,
};

/// Round-robin dispatcher over a fixed set of backends.
#[derive(Debug)]
pub struct Balancer {
    port: u16,
    backends: Vec<Arc<dyn Backend>>,
    rotation: RoundRobin,
}

impl Balancer {
    /// Create a balancer serving `port` over `backends`, in order.
    pub fn new(port: u16, backends: Vec<Arc<dyn Backend>>) -> Result<Self, BalancerError> {
        if backends.is_empty() {
            return Err(BalancerError::EmptyPool);
        }

        Ok(Self {
            port,
            backends,
            rotation: RoundRobin::new(),
        })
    }

    /// Port the proxy listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The backend roster in rotation order.
    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    /// Select the next live backend.
    pub fn select_next(&self) -> Result<Arc<dyn Backend>, BalancerError> {
        self.rotation.next_server(&self.backends).ok_or_else(|| {
            tracing::warn!(backend_count = self.backends.len(), "No live backends");
            BalancerError::NoAvailableBackend
        })
    }

    /// Forward `request` to the next backend and return its response as-is.
    pub async fn serve(&self, request: Request<Body>) -> Result<Response<Body>, BalancerError> {
        let backend = self.select_next()?;

        tracing::info!(
            backend = %backend.address(),
            method = %request.method(),
            path = %request.uri().path(),
            "Forwarding request"
        );

        Ok(backend.forward(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::backend::stub::StubBackend;
    use std::sync::atomic::Ordering;

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = Balancer::new(8000, Vec::new()).unwrap_err();
        assert!(matches!(err, BalancerError::EmptyPool));
    }

    #[test]
    fn test_select_next_cycles_in_order() {
        let balancer = Balancer::new(
            8000,
            vec![
                StubBackend::shared("http://a:80", true),
                StubBackend::shared("http://b:80", true),
                StubBackend::shared("http://c:80", true),
            ],
        )
        .unwrap();

        let hosts: Vec<String> = (0..7)
            .map(|_| balancer.select_next().unwrap().address().host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, ["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_select_next_skips_dead() {
        let balancer = Balancer::new(
            8000,
            vec![
                StubBackend::shared("http://a:80", true),
                StubBackend::shared("http://b:80", false),
                StubBackend::shared("http://c:80", true),
            ],
        )
        .unwrap();

        let hosts: Vec<String> = (0..4)
            .map(|_| balancer.select_next().unwrap().address().host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, ["a", "c", "a", "c"]);
    }

    #[tokio::test]
    async fn test_serve_delegates_to_selected_backend() {
        let a = StubBackend::new("http://a:80", true);
        let b = StubBackend::new("http://b:80", true);
        let balancer = Balancer::new(8000, vec![a.clone() as Arc<dyn Backend>, b.clone() as Arc<dyn Backend>]).unwrap();

        assert_eq!(body_string(balancer.serve(request()).await.unwrap()).await, "http://a/");
        assert_eq!(body_string(balancer.serve(request()).await.unwrap()).await, "http://b/");
        assert_eq!(body_string(balancer.serve(request()).await.unwrap()).await, "http://a/");

        assert_eq!(a.hits.load(Ordering::Relaxed), 2);
        assert_eq!(b.hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_serve_with_no_live_backend() {
        let a = StubBackend::new("http://a:80", false);
        let balancer = Balancer::new(8000, vec![a.clone() as Arc<dyn Backend>]).unwrap();

        let err = balancer.serve(request()).await.unwrap_err();
        assert!(matches!(err, BalancerError::NoAvailableBackend));
        assert_eq!(a.hits.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_serve_spreads_evenly() {
        let stubs: Vec<_> = ["http://a:80", "http://b:80", "http://c:80", "http://d:80"]
            .iter()
            .map(|addr| StubBackend::new(addr, true))
            .collect();
        let backends: Vec<Arc<dyn Backend>> = stubs.iter().map(|s| s.clone() as Arc<dyn Backend>).collect();
        let balancer = Arc::new(Balancer::new(8000, backends).unwrap());

        let tasks: Vec<_> = (0..200)
            .map(|_| {
                let balancer = balancer.clone();
                tokio::spawn(async move { balancer.serve(request()).await.is_ok() })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        for stub in &stubs {
            assert_eq!(stub.hits.load(Ordering::Relaxed), 50);
        }
    }
}
