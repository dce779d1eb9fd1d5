//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (request ID, tracing span)
//!     → load balancer picks a backend and forwards
//!     → response.rs (errors mapped to status codes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestSpan, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
