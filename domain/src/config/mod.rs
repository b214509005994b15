//! Configuration domain: document model, validation and errors.

pub mod entities;
pub mod error;
pub mod validation;

pub use entities::{AccountRecord, ConfigDocument, LogLevel, SystemSettings};
pub use error::ConfigError;
pub use validation::{validate_account, validate_document};
