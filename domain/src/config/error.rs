//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating, mutating or persisting the
/// configuration document.
///
/// Mutator errors never leave the store in a partially-applied state.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Validate(String),

    #[error("refusing to use config path outside allowed locations: {0}")]
    PathUnsafe(PathBuf),

    #[error("config file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("account '{0}' already exists")]
    AccountExists(String),

    #[error("account '{0}' does not exist")]
    AccountMissing(String),

    #[error("account '{name}' is invalid: {reason}")]
    AccountInvalid { name: String, reason: String },

    #[error("account '{0}' is the default account and cannot be removed")]
    DefaultAccountLocked(String),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Parse { .. } => "config_parse",
            ConfigError::Validate(_) => "config_validate",
            ConfigError::PathUnsafe(_) => "config_path_unsafe",
            ConfigError::Io { .. } => "config_io",
            ConfigError::AccountExists(_) => "account_exists",
            ConfigError::AccountMissing(_) => "account_missing",
            ConfigError::AccountInvalid { .. } => "account_invalid",
            ConfigError::DefaultAccountLocked(_) => "default_account_locked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::AccountMissing("primary".to_string());
        assert_eq!(err.to_string(), "account 'primary' does not exist");

        let err = ConfigError::DefaultAccountLocked("primary".to_string());
        assert!(err.to_string().contains("default account"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            ConfigError::Validate("x".to_string()).kind(),
            "config_validate"
        );
        assert_eq!(
            ConfigError::io("/tmp/x", std::io::Error::other("boom")).kind(),
            "config_io"
        );
    }
}
