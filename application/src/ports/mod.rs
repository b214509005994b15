//! Ports: interfaces implemented by the infrastructure layer

pub mod clock;
pub mod config_reader;
pub mod health_probe;
pub mod tool_handler;
