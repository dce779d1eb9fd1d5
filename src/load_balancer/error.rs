//! Load balancer error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::ValidationError;

/// Failure while relaying one request to one backend.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The upstream request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    /// Connection or protocol failure talking to the backend.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The backend did not produce response headers before the deadline.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Errors raised by the balancer, at construction or per request.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// The balancer was given no backends.
    #[error("backend pool is empty")]
    EmptyPool,

    /// A backend address was rejected at construction.
    #[error("invalid backend address: {0}")]
    InvalidAddress(#[from] ValidationError),

    /// Every backend reported not alive.
    #[error("no backend available")]
    NoAvailableBackend,

    /// The chosen backend failed.
    #[error(transparent)]
    Forward(#[from] ForwardError),
}
