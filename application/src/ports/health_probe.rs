//! Health Probe port
//!
//! One probe per component that deep health fans out to (the metrics
//! subsystem, and any provider-bound checks attached at startup).

use async_trait::async_trait;
use linodemcp_domain::health::ComponentHealth;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Component key in the health response, e.g. `"metrics"`
    fn component(&self) -> &str;

    /// Check the component. Time bounds are applied by the caller.
    async fn check(&self) -> ComponentHealth;
}
