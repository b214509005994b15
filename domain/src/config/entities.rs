//! Configuration entities: the in-memory shape of the broker's config file.
//!
//! A [`ConfigDocument`] is the unit the config store loads, validates,
//! persists and hands out as snapshots. It holds one [`SystemSettings`]
//! record and an ordered map of named [`AccountRecord`]s.
//!
//! | Field | Default |
//! |-------|---------|
//! | `server_name` | `linodemcp` |
//! | `log_level` | `info` |
//! | `enable_metrics` | `true` |
//! | `metrics_port` | `9090` |
//! | `default_account` | *(empty)* |
//! | `log_file` | *(empty, stderr only)* |
//! | `log_max_size` / `log_max_backups` / `log_max_age` | `10` MB / `5` / `30` days |

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;
use crate::credentials::token::redact;

/// Default server label reported in `initialize` and health responses.
pub const DEFAULT_SERVER_NAME: &str = "linodemcp";

/// Default sidecar port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Default maximum log file size in megabytes.
pub const DEFAULT_LOG_MAX_SIZE: u32 = 10;

/// Default number of rotated log files to keep.
pub const DEFAULT_LOG_MAX_BACKUPS: u32 = 5;

/// Default log file retention in days.
pub const DEFAULT_LOG_MAX_AGE: u32 = 30;

/// Log verbosity accepted in `system.log_level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::Validate(format!(
                "system.log_level: unknown value '{}' (expected debug, info, warn or error)",
                other
            ))),
        }
    }
}

/// Process-wide settings stored in the `[system]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSettings {
    /// Server label, never empty
    pub server_name: String,
    pub log_level: LogLevel,
    /// Whether `/metrics` serves scrape data
    pub enable_metrics: bool,
    /// Sidecar port; `0` lets the OS pick
    pub metrics_port: u16,
    /// Name of the account used when a tool does not specify one
    pub default_account: String,
    /// Optional log file path; empty means stderr only
    pub log_file: String,
    pub log_max_size: u32,
    pub log_max_backups: u32,
    pub log_max_age: u32,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            log_level: LogLevel::Info,
            enable_metrics: true,
            metrics_port: DEFAULT_METRICS_PORT,
            default_account: String::new(),
            log_file: String::new(),
            log_max_size: DEFAULT_LOG_MAX_SIZE,
            log_max_backups: DEFAULT_LOG_MAX_BACKUPS,
            log_max_age: DEFAULT_LOG_MAX_AGE,
        }
    }
}

/// Credentials and metadata for one named provider account.
///
/// `token` and `label` are either both set or both empty ("unset").
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    pub token: String,
    pub label: String,
    /// Optional override of the provider API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apiurl: Option<String>,
}

impl AccountRecord {
    pub fn new(token: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
            apiurl: None,
        }
    }

    pub fn with_apiurl(mut self, apiurl: impl Into<String>) -> Self {
        self.apiurl = Some(apiurl.into());
        self
    }

    /// Both token and label are empty.
    pub fn is_unset(&self) -> bool {
        self.token.is_empty() && self.label.is_empty()
    }

    /// Both token and label are present.
    pub fn is_complete(&self) -> bool {
        !self.token.is_empty() && !self.label.is_empty()
    }

    /// Token in a form safe for logs and tool output.
    pub fn redacted_token(&self) -> String {
        redact(&self.token)
    }
}

// Tokens must never reach log output through `{:?}`.
impl fmt::Debug for AccountRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountRecord")
            .field("token", &self.redacted_token())
            .field("label", &self.label)
            .field("apiurl", &self.apiurl)
            .finish()
    }
}

/// The complete configuration: system settings plus named accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDocument {
    pub system: SystemSettings,
    /// Accounts keyed (and therefore ordered) by name
    pub accounts: BTreeMap<String, AccountRecord>,
}

impl ConfigDocument {
    /// Defaults document: fixed system settings, no accounts, no default.
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn account(&self, name: &str) -> Option<&AccountRecord> {
        self.accounts.get(name)
    }

    /// The default account record, if one is configured.
    pub fn default_account(&self) -> Option<(&str, &AccountRecord)> {
        if self.system.default_account.is_empty() {
            return None;
        }
        self.accounts
            .get_key_value(&self.system.default_account)
            .map(|(name, record)| (name.as_str(), record))
    }

    pub fn account_names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }
}
