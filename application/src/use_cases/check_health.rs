//! Check Health use case
//!
//! Fans out to every registered [`HealthProbe`] in parallel, bounds each
//! probe by a per-probe timeout, and folds the results into a
//! [`HealthStatus`]. A probe that times out is reported `unhealthy` with
//! message `"timeout"`; a probe that panics is reported `unhealthy` too.
//! Neither fails the response as a whole.

use crate::ports::clock::Clock;
use crate::ports::health_probe::HealthProbe;
use futures::future::join_all;
use linodemcp_domain::health::{ComponentHealth, HealthStatus};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct CheckHealthUseCase {
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl CheckHealthUseCase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            probes: Vec::new(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            clock,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Run all probes and aggregate.
    pub async fn execute(&self) -> HealthStatus {
        let started = self.clock.now();
        let timestamp = self.clock.utc_now();

        let tasks = self.probes.iter().map(|probe| {
            let probe = Arc::clone(probe);
            let component = probe.component().to_string();
            let timeout = self.probe_timeout;
            let clock = Arc::clone(&self.clock);
            let handle = tokio::spawn(async move {
                let probe_started = clock.now();
                match tokio::time::timeout(timeout, probe.check()).await {
                    Ok(health) => health.with_duration(clock.now() - probe_started),
                    Err(_) => ComponentHealth::unhealthy("timeout").with_duration(timeout),
                }
            });
            async move {
                let health = match handle.await {
                    Ok(health) => health,
                    Err(e) => {
                        warn!(component = %component, error = %e, "Health probe aborted");
                        ComponentHealth::unhealthy("check panicked")
                    }
                };
                (component, health)
            }
        });

        let components: BTreeMap<String, ComponentHealth> = join_all(tasks).await.into_iter().collect();
        let elapsed = self.clock.now().saturating_duration_since(started);
        let status = HealthStatus::from_components(components, timestamp, elapsed);

        debug!(
            status = %status.status,
            components = status.components.len(),
            "Health check complete"
        );
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::clock::SystemClock;
    use async_trait::async_trait;
    use linodemcp_domain::health::HealthState;

    struct FixedProbe {
        name: &'static str,
        health: ComponentHealth,
    }

    #[async_trait]
    impl HealthProbe for FixedProbe {
        fn component(&self) -> &str {
            self.name
        }

        async fn check(&self) -> ComponentHealth {
            self.health.clone()
        }
    }

    struct SlowProbe;

    #[async_trait]
    impl HealthProbe for SlowProbe {
        fn component(&self) -> &str {
            "slow"
        }

        async fn check(&self) -> ComponentHealth {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ComponentHealth::healthy("eventually")
        }
    }

    struct PanickingProbe;

    #[async_trait]
    impl HealthProbe for PanickingProbe {
        fn component(&self) -> &str {
            "broken"
        }

        async fn check(&self) -> ComponentHealth {
            panic!("probe exploded");
        }
    }

    fn fixed(name: &'static str, health: ComponentHealth) -> Arc<dyn HealthProbe> {
        Arc::new(FixedProbe { name, health })
    }

    #[tokio::test]
    async fn test_no_probes_is_healthy() {
        let use_case = CheckHealthUseCase::new(Arc::new(SystemClock));
        let status = use_case.execute().await;
        assert_eq!(status.status, HealthState::Healthy);
        assert!(status.components.is_empty());
    }

    #[tokio::test]
    async fn test_degraded_component_degrades_overall() {
        let use_case = CheckHealthUseCase::new(Arc::new(SystemClock))
            .with_probe(fixed("metrics", ComponentHealth::degraded("disabled")))
            .with_probe(fixed("provider", ComponentHealth::healthy("ok")));

        let status = use_case.execute().await;
        assert_eq!(status.status, HealthState::Degraded);
        assert_eq!(status.components.len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_marks_component_unhealthy() {
        let use_case = CheckHealthUseCase::new(Arc::new(SystemClock))
            .with_probe_timeout(Duration::from_millis(50))
            .with_probe(Arc::new(SlowProbe))
            .with_probe(fixed("metrics", ComponentHealth::healthy("ok")));

        let status = use_case.execute().await;
        assert_eq!(status.status, HealthState::Unhealthy);
        let slow = &status.components["slow"];
        assert_eq!(slow.status, HealthState::Unhealthy);
        assert_eq!(slow.message, "timeout");
        assert_eq!(status.components["metrics"].status, HealthState::Healthy);
    }

    #[tokio::test]
    async fn test_panicking_probe_is_contained() {
        let use_case = CheckHealthUseCase::new(Arc::new(SystemClock))
            .with_probe(Arc::new(PanickingProbe))
            .with_probe(fixed("metrics", ComponentHealth::healthy("ok")));

        let status = use_case.execute().await;
        assert_eq!(status.components["broken"].status, HealthState::Unhealthy);
        assert_eq!(status.status, HealthState::Unhealthy);
    }
}
