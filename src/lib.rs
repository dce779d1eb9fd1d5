//! Round-robin HTTP reverse proxy library.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{Backend, Balancer, BalancerError, ForwardError, HttpBackend};
