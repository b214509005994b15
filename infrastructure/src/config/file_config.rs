//! Raw TOML configuration data types
//!
//! These structs mirror the on-disk file exactly. Numeric knobs are read as
//! `i64` so that out-of-range values are reported by validation instead of
//! failing deserialization with an unhelpful overflow message.
//!
//! ```toml
//! [system]
//! server_name = "linodemcp"
//! log_level = "info"
//! enable_metrics = true
//! metrics_port = 9090
//! default_account = "primary"
//!
//! [account.primary]
//! token = "..."
//! label = "Primary"
//! apiurl = "https://api.linode.com/v4"
//! ```

use linodemcp_domain::config::entities::{
    DEFAULT_LOG_MAX_AGE, DEFAULT_LOG_MAX_BACKUPS, DEFAULT_LOG_MAX_SIZE, DEFAULT_METRICS_PORT,
    DEFAULT_SERVER_NAME,
};
use linodemcp_domain::config::{AccountRecord, ConfigDocument, ConfigError, SystemSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw `[system]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    pub server_name: String,
    pub log_level: String,
    pub enable_metrics: bool,
    pub metrics_port: i64,
    pub default_account: String,
    pub log_file: String,
    pub log_max_size: i64,
    pub log_max_backups: i64,
    pub log_max_age: i64,
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            log_level: "info".to_string(),
            enable_metrics: true,
            metrics_port: i64::from(DEFAULT_METRICS_PORT),
            default_account: String::new(),
            log_file: String::new(),
            log_max_size: i64::from(DEFAULT_LOG_MAX_SIZE),
            log_max_backups: i64::from(DEFAULT_LOG_MAX_BACKUPS),
            log_max_age: i64::from(DEFAULT_LOG_MAX_AGE),
        }
    }
}

/// Raw `[account.<name>]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAccountConfig {
    pub token: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apiurl: Option<String>,
}

/// Complete raw configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub system: FileSystemConfig,
    pub account: BTreeMap<String, FileAccountConfig>,
}

impl FileConfig {
    /// Convert into the domain document, checking numeric ranges and the
    /// log level. Cross-field rules are left to `validate_document`.
    pub fn into_document(self) -> Result<ConfigDocument, ConfigError> {
        let system = self.system;
        let log_level = system.log_level.parse()?;
        let metrics_port = u16::try_from(system.metrics_port).map_err(|_| {
            ConfigError::Validate(format!(
                "system.metrics_port: {} is outside 0..=65535",
                system.metrics_port
            ))
        })?;

        let settings = SystemSettings {
            server_name: system.server_name,
            log_level,
            enable_metrics: system.enable_metrics,
            metrics_port,
            default_account: system.default_account,
            log_file: system.log_file,
            log_max_size: non_negative("log_max_size", system.log_max_size)?,
            log_max_backups: non_negative("log_max_backups", system.log_max_backups)?,
            log_max_age: non_negative("log_max_age", system.log_max_age)?,
        };

        let accounts = self
            .account
            .into_iter()
            .map(|(name, raw)| {
                let record = AccountRecord {
                    token: raw.token,
                    label: raw.label,
                    apiurl: raw.apiurl.filter(|url| !url.is_empty()),
                };
                (name, record)
            })
            .collect();

        Ok(ConfigDocument {
            system: settings,
            accounts,
        })
    }

    /// Raw form of a document, ready to be serialized.
    pub fn from_document(doc: &ConfigDocument) -> Self {
        let system = &doc.system;
        Self {
            system: FileSystemConfig {
                server_name: system.server_name.clone(),
                log_level: system.log_level.as_str().to_string(),
                enable_metrics: system.enable_metrics,
                metrics_port: i64::from(system.metrics_port),
                default_account: system.default_account.clone(),
                log_file: system.log_file.clone(),
                log_max_size: i64::from(system.log_max_size),
                log_max_backups: i64::from(system.log_max_backups),
                log_max_age: i64::from(system.log_max_age),
            },
            account: doc
                .accounts
                .iter()
                .map(|(name, record)| {
                    let raw = FileAccountConfig {
                        token: record.token.clone(),
                        label: record.label.clone(),
                        apiurl: record.apiurl.clone(),
                    };
                    (name.clone(), raw)
                })
                .collect(),
        }
    }

    /// Render as TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Validate(format!("failed to serialize config: {}", e)))
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| {
        ConfigError::Validate(format!(
            "system.{}: {} must be a non-negative integer",
            field, value
        ))
    })
}
