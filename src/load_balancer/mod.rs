//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → balancer.rs (Balancer::serve)
//!     → round_robin.rs (next live backend, bounded scan)
//!     → backend.rs (Backend::forward via the shared HTTP client)
//!     → Return upstream response or error
//! ```
//!
//! # Design Decisions
//! - Backend roster is fixed at startup and never mutated
//! - The rotation counter is the only shared mutable state; it lives in the
//!   balancer instance, not in a global
//! - Selection never holds anything across the forwarding call
//! - A pool with no live backend fails fast instead of spinning

pub mod backend;
pub mod balancer;
pub mod error;
pub mod round_robin;

pub use backend::{Backend, HttpBackend};
pub use balancer::Balancer;
pub use error::{BalancerError, ForwardError};
