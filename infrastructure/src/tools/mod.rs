//! Tool catalog: the registry and the built-in handlers
//!
//! Provider-bound handlers implement the same `ToolHandler` port and are
//! registered next to the built-ins.

pub mod builtin;
pub mod registry;

pub use builtin::{AccountListTool, BuildInfo, HealthCheckTool, HelloTool, VersionTool};
pub use registry::{RegistryError, ToolRegistry};
