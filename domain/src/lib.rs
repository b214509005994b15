//! Domain layer for linodemcp
//!
//! Pure types and rules with no I/O: the configuration document and its
//! validation, tool descriptors and handler results, credential token
//! validation and redaction, and health status derivation.
//!
//! # Core Concepts
//!
//! - **ConfigDocument**: system settings plus named provider accounts
//! - **ToolDescriptor**: name, description and input schema of a callable tool
//! - **TokenRule**: format and length rule for a credential string
//! - **HealthStatus**: aggregated component health with a derived overall state

pub mod config;
pub mod credentials;
pub mod health;
pub mod tool;

pub use config::{
    AccountRecord, ConfigDocument, ConfigError, LogLevel, SystemSettings, validate_account,
    validate_document,
};
pub use credentials::{
    TokenError, TokenFormat, TokenRejection, TokenRule, TokenValidation, redact, scrub_secrets,
    validate_token,
};
pub use health::{ComponentHealth, HealthState, HealthStatus, determine_overall_status};
pub use tool::{ContentBlock, ToolDescriptor, ToolDescriptorError, ToolError, ToolOutput};
