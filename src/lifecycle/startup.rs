//! Startup orchestration.
//!
//! Turns a validated [`ProxyConfig`] into a running-ready [`Balancer`].
//! Any bad backend address is fatal here, before a socket is bound.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::load_balancer::{
    backend::{build_client, Backend, HttpBackend},
    Balancer, BalancerError,
};

/// Create one [`HttpBackend`] per configured address, all sharing a client,
/// and wrap them in a [`Balancer`] in roster order.
pub fn build_balancer(config: &ProxyConfig) -> Result<Balancer, BalancerError> {
    let client = build_client(&config.timeouts);
    let upstream_timeout = Duration::from_secs(config.timeouts.upstream_secs);

    let backends = config
        .backends
        .iter()
        .map(|backend| -> Result<Arc<dyn Backend>, BalancerError> {
            let backend = HttpBackend::new(&backend.address, client.clone(), upstream_timeout)?;
            tracing::info!(address = %backend.address(), "Backend registered");
            Ok(Arc::new(backend) as Arc<dyn Backend>)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Balancer::new(config.listener.port, backends)
}
