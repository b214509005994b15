//! HTTP sidecar: scrape, liveness and deep-health endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod probe;
pub mod rate_limit;
pub mod server;
pub mod state;
pub mod tls;

pub use config::{BasicAuthCredentials, RateLimitSettings, SidecarConfig, TlsFiles};
pub use error::SidecarError;
pub use probe::MetricsProbe;
pub use rate_limit::RateLimiter;
pub use server::{MetricsServer, build_router};
pub use state::SidecarState;
