//! Health domain: component states and overall status derivation

pub mod entities;

pub use entities::{ComponentHealth, HealthState, HealthStatus, determine_overall_status};
