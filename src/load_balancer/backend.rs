//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server behind the [`Backend`] trait
//! - Report liveness for the selection loop
//! - Forward one request/response pair with reverse-proxy semantics
//!
//! [`HttpBackend`] is the only production implementation. Its liveness is
//! constant; other implementations can plug in a real health signal without
//! touching the balancer.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use url::{Position, Url};

use crate::config::{validation::check_backend_address, TimeoutConfig};
use crate::load_balancer::error::{BalancerError, ForwardError};

/// Shared upstream client, speaking plain HTTP or HTTP over TLS.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Header the proxy appends the client address to.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that describe a single connection and are never relayed.
/// `Upgrade` is among them: protocol upgrades are not proxied.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// One upstream target.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// The configured upstream address.
    fn address(&self) -> &Url;

    /// Whether this backend may be selected. Must not block.
    fn is_alive(&self) -> bool;

    /// Relay `request` to the upstream and return its response.
    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>>;
}

/// Build the client shared by every [`HttpBackend`].
pub fn build_client(timeouts: &TimeoutConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    connector.enforce_http(false);

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(connector);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .pool_timer(TokioTimer::new())
        .build(connector)
}

/// An `http` or `https` upstream reached through the shared client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    address: Url,
    /// `host[:port]` of the upstream, precomputed for URI rewriting.
    authority: String,
    client: HttpClient,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend for `address`, failing on anything that is not an
    /// absolute `http` or `https` URL.
    pub fn new(address: &str, client: HttpClient, timeout: Duration) -> Result<Self, BalancerError> {
        let address = check_backend_address(address)?;
        let authority = address[Position::BeforeHost..Position::AfterPort].to_string();

        Ok(Self {
            address,
            authority,
            client,
            timeout,
        })
    }

    /// Rewrite an inbound URI onto this backend: base path joined with the
    /// request path, queries concatenated.
    fn target_uri(&self, incoming: &Uri) -> Result<Uri, ForwardError> {
        let path = join_paths(self.address.path(), incoming.path());
        let path_and_query = match (self.address.query().unwrap_or(""), incoming.query().unwrap_or("")) {
            ("", "") => path,
            ("", q) | (q, "") => format!("{}?{}", path, q),
            (base, q) => format!("{}?{}&{}", path, base, q),
        };

        Ok(Uri::builder()
            .scheme(self.address.scheme())
            .authority(self.authority.as_str())
            .path_and_query(path_and_query)
            .build()?)
    }

    fn upstream_request(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        parts.uri = self.target_uri(&parts.uri)?;
        // The pooled connections speak HTTP/1.1 regardless of the inbound version.
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut parts.headers, ip);
        }

        Ok(Request::from_parts(parts, body))
    }
}

impl Backend for HttpBackend {
    fn address(&self) -> &Url {
        &self.address
    }

    fn is_alive(&self) -> bool {
        true
    }

    fn forward(&self, request: Request<Body>) -> BoxFuture<'_, Result<Response<Body>, ForwardError>> {
        Box::pin(async move {
            let request = self.upstream_request(request)?;
            let response = tokio::time::timeout(self.timeout, self.client.request(request))
                .await
                .map_err(|_| ForwardError::Timeout(self.timeout))??;

            Ok(downstream_response(response.map(Body::new)))
        })
    }
}

/// Relay an upstream response to the caller, minus hop-by-hop headers.
fn downstream_response(mut response: Response<Body>) -> Response<Body> {
    strip_hop_by_hop(response.headers_mut());
    response
}

/// Join two URL paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Append the client address to `X-Forwarded-For`, merging prior values.
fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
