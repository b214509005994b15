use std::sync::Arc;

use async_trait::async_trait;
use linodemcp_application::HealthProbe;
use linodemcp_domain::health::ComponentHealth;

use crate::metrics::BrokerMetrics;

pub const METRICS_COMPONENT: &str = "metrics";

/// Health of the metrics subsystem: degraded while collection is switched
/// off, unhealthy if the registry cannot be gathered.
pub struct MetricsProbe {
    metrics: Arc<BrokerMetrics>,
    enabled: bool,
}

impl MetricsProbe {
    pub fn new(metrics: Arc<BrokerMetrics>, enabled: bool) -> Self {
        Self { metrics, enabled }
    }

    pub fn check_now(&self) -> ComponentHealth {
        if !self.enabled {
            return ComponentHealth::degraded("metrics collection disabled");
        }
        match self.metrics.encode_text() {
            Ok(_) => ComponentHealth::healthy("metrics registry responsive"),
            Err(e) => ComponentHealth::unhealthy(format!("metrics registry failed: {}", e)),
        }
    }
}

#[async_trait]
impl HealthProbe for MetricsProbe {
    fn component(&self) -> &str {
        METRICS_COMPONENT
    }

    async fn check(&self) -> ComponentHealth {
        self.check_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodemcp_domain::health::HealthState;

    #[tokio::test]
    async fn test_enabled_is_healthy() {
        let probe = MetricsProbe::new(Arc::new(BrokerMetrics::new().unwrap()), true);
        assert_eq!(probe.check().await.status, HealthState::Healthy);
        assert_eq!(probe.component(), "metrics");
    }

    #[tokio::test]
    async fn test_disabled_is_degraded() {
        let probe = MetricsProbe::new(Arc::new(BrokerMetrics::new().unwrap()), false);
        let health = probe.check().await;
        assert_eq!(health.status, HealthState::Degraded);
        assert!(health.message.contains("disabled"));
    }
}
