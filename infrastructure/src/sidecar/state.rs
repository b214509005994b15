use std::sync::Arc;

use linodemcp_application::{CheckHealthUseCase, Clock};

use super::config::{BasicAuthCredentials, SidecarConfig};
use super::probe::MetricsProbe;
use super::rate_limit::RateLimiter;
use crate::metrics::BrokerMetrics;

/// Shared by every handler and middleware of one sidecar instance.
pub struct SidecarState {
    pub service_name: String,
    pub service_version: String,
    pub metrics_enabled: bool,
    pub tls_enabled: bool,
    pub auth: Option<BasicAuthCredentials>,
    pub metrics: Arc<BrokerMetrics>,
    pub liveness: MetricsProbe,
    pub deep_health: Arc<CheckHealthUseCase>,
    pub limiter: RateLimiter,
    pub clock: Arc<dyn Clock>,
}

impl SidecarState {
    pub fn new(
        config: &SidecarConfig,
        metrics: Arc<BrokerMetrics>,
        deep_health: Arc<CheckHealthUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service_name: config.service_name.clone(),
            service_version: config.service_version.clone(),
            metrics_enabled: config.metrics_enabled,
            tls_enabled: config.tls_enabled(),
            auth: config.basic_auth.clone(),
            liveness: MetricsProbe::new(Arc::clone(&metrics), config.metrics_enabled),
            metrics,
            deep_health,
            limiter: RateLimiter::new(config.rate_limit, Arc::clone(&clock)),
            clock,
        }
    }
}
