//! Infrastructure layer for linodemcp
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the TOML config store, the tool registry and
//! built-in tools, the stdio JSON-RPC dispatcher, Prometheus metrics and
//! the HTTP sidecar.

pub mod config;
pub mod jsonrpc;
pub mod metrics;
pub mod sidecar;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigManager, EnvOverrides};
pub use jsonrpc::{DispatchError, Dispatcher, DispatcherConfig, TransportError};
pub use metrics::{BrokerMetrics, MetricsError};
pub use sidecar::{MetricsProbe, MetricsServer, SidecarConfig, SidecarError};
pub use tools::{
    AccountListTool, BuildInfo, HealthCheckTool, HelloTool, RegistryError, ToolRegistry,
    VersionTool,
};
