//! Error responses.
//!
//! Per-request failures become a status code and a generic message. Backend
//! addresses and transport details are logged, never sent to the caller.
//!
//! | error                       | status |
//! |-----------------------------|--------|
//! | no live backend             | 503    |
//! | upstream deadline exceeded  | 504    |
//! | any other forwarding error  | 502    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::{BalancerError, ForwardError};

impl BalancerError {
    /// Status code reported to the caller for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            BalancerError::NoAvailableBackend => StatusCode::SERVICE_UNAVAILABLE,
            BalancerError::Forward(ForwardError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            BalancerError::Forward(_) => StatusCode::BAD_GATEWAY,
            BalancerError::EmptyPool | BalancerError::InvalidAddress(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            BalancerError::NoAvailableBackend => "no backend available",
            BalancerError::Forward(ForwardError::Timeout(_)) => "upstream timed out",
            BalancerError::Forward(_) => "upstream request failed",
            BalancerError::EmptyPool | BalancerError::InvalidAddress(_) => "internal error",
        }
    }
}

impl IntoResponse for BalancerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }
        (status, self.public_message()).into_response()
    }
}
