//! Application layer for linodemcp
//!
//! This crate contains port definitions and use cases.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    clock::{Clock, ManualClock, SystemClock},
    config_reader::{ConfigReader, StaticConfig},
    health_probe::HealthProbe,
    tool_handler::ToolHandler,
};
pub use use_cases::check_health::{CheckHealthUseCase, DEFAULT_PROBE_TIMEOUT};
