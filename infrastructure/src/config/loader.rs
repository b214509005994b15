//! Configuration file loading and environment overrides
//!
//! The file is parsed through `figment` with the raw defaults as the base
//! layer, so missing keys take their default values. Environment variables
//! are a separate overlay ([`EnvOverrides`]) that adjusts the effective
//! runtime settings and is never written back to disk.

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use linodemcp_domain::config::{ConfigDocument, ConfigError, SystemSettings, validate_document};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
pub const APP_DIR: &str = "linodemcp";

/// File name of the configuration file
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variables honoured by [`EnvOverrides`]
pub const ENV_KEYS: &[&str] = &[
    "SERVER_NAME",
    "LOG_LEVEL",
    "ENABLE_METRICS",
    "METRICS_PORT",
    "METRICS_AUTH_USERNAME",
    "METRICS_AUTH_PASSWORD",
    "METRICS_TLS_ENABLED",
    "METRICS_TLS_CERT_FILE",
    "METRICS_TLS_KEY_FILE",
    "DAEMON_MODE",
];

/// Configuration loader for the on-disk document
pub struct ConfigLoader;

impl ConfigLoader {
    /// Platform config path: `<config_dir>/linodemcp/config.toml`
    ///
    /// `$XDG_CONFIG_HOME` (or `~/.config`) on Linux, `~/Library/Application
    /// Support` on macOS, `%APPDATA%` on Windows.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Read and validate the document at `path`.
    ///
    /// A missing file is an I/O error here; `ConfigManager::load_or_create`
    /// handles absence before calling this.
    pub fn read(path: &Path) -> Result<ConfigDocument, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::parse(path, &text)
    }

    /// Parse TOML text into a validated document.
    pub fn parse(path: &Path, text: &str) -> Result<ConfigDocument, ConfigError> {
        let raw: FileConfig = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::string(text))
            .extract()
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let doc = raw.into_document()?;
        validate_document(&doc)?;
        Ok(doc)
    }

    /// Render a document as TOML text.
    pub fn render(doc: &ConfigDocument) -> Result<String, ConfigError> {
        FileConfig::from_document(doc).to_toml()
    }
}

/// Runtime overrides read from the process environment.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvOverrides {
    pub server_name: Option<String>,
    pub log_level: Option<String>,
    pub enable_metrics: Option<bool>,
    pub metrics_port: Option<i64>,
    pub metrics_auth_username: Option<String>,
    pub metrics_auth_password: Option<String>,
    pub metrics_tls_enabled: Option<bool>,
    pub metrics_tls_cert_file: Option<String>,
    pub metrics_tls_key_file: Option<String>,
    pub daemon_mode: Option<bool>,
}

impl EnvOverrides {
    /// Extract the recognised variables from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Figment::from(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| ConfigError::Validate(format!("environment override: {}", e)))
    }

    /// Apply the system-level overrides to `settings`.
    pub fn apply(&self, settings: &mut SystemSettings) -> Result<(), ConfigError> {
        if let Some(name) = &self.server_name
            && !name.trim().is_empty()
        {
            settings.server_name = name.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.parse()?;
        }
        if let Some(enabled) = self.enable_metrics {
            settings.enable_metrics = enabled;
        }
        if let Some(port) = self.metrics_port {
            settings.metrics_port = u16::try_from(port).map_err(|_| {
                ConfigError::Validate(format!("METRICS_PORT: {} is outside 0..=65535", port))
            })?;
        }
        Ok(())
    }

    pub fn daemon_mode(&self) -> bool {
        self.daemon_mode.unwrap_or(false)
    }

    pub fn tls_enabled(&self) -> bool {
        self.metrics_tls_enabled.unwrap_or(false)
    }
}

impl fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvOverrides")
            .field("server_name", &self.server_name)
            .field("log_level", &self.log_level)
            .field("enable_metrics", &self.enable_metrics)
            .field("metrics_port", &self.metrics_port)
            .field("metrics_auth_username", &self.metrics_auth_username)
            .field(
                "metrics_auth_password",
                &self.metrics_auth_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("metrics_tls_enabled", &self.metrics_tls_enabled)
            .field("metrics_tls_cert_file", &self.metrics_tls_cert_file)
            .field("metrics_tls_key_file", &self.metrics_tls_key_file)
            .field("daemon_mode", &self.daemon_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use linodemcp_domain::config::LogLevel;

    #[test]
    fn test_default_path_uses_app_dir() {
        let path = ConfigLoader::default_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.ends_with("linodemcp/config.toml"));
    }

    #[test]
    fn test_parse_fills_defaults() {
        let doc = ConfigLoader::parse(Path::new("c.toml"), "[system]\nserver_name = \"x\"\n").unwrap();
        assert_eq!(doc.system.server_name, "x");
        assert_eq!(doc.system.metrics_port, 9090);
        assert_eq!(doc.system.log_level, LogLevel::Info);
    }

    #[test]
    fn test_parse_error_carries_path() {
        let err = ConfigLoader::parse(Path::new("broken.toml"), "[system\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_type_mismatch_is_parse_error() {
        let err =
            ConfigLoader::parse(Path::new("c.toml"), "[system]\nmetrics_port = \"high\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_parse_runs_validation() {
        let err = ConfigLoader::parse(
            Path::new("c.toml"),
            "[system]\ndefault_account = \"ghost\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validate(_)));
    }

    #[test]
    fn test_read_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::read(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides_apply() {
        Jail::expect_with(|jail| {
            jail.set_env("SERVER_NAME", "from-env");
            jail.set_env("LOG_LEVEL", "debug");
            jail.set_env("ENABLE_METRICS", "false");
            jail.set_env("METRICS_PORT", "0");
            jail.set_env("DAEMON_MODE", "true");

            let overrides = EnvOverrides::from_env().expect("overrides");
            assert!(overrides.daemon_mode());

            let mut settings = SystemSettings::default();
            overrides.apply(&mut settings).expect("apply");
            assert_eq!(settings.server_name, "from-env");
            assert_eq!(settings.log_level, LogLevel::Debug);
            assert!(!settings.enable_metrics);
            assert_eq!(settings.metrics_port, 0);
            Ok(())
        });
    }

    #[test]
    fn test_env_port_out_of_range() {
        Jail::expect_with(|jail| {
            jail.set_env("METRICS_PORT", "70000");
            let overrides = EnvOverrides::from_env().expect("overrides");
            let mut settings = SystemSettings::default();
            assert!(overrides.apply(&mut settings).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_env_debug_hides_password() {
        let overrides = EnvOverrides {
            metrics_auth_password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", overrides);
        assert!(!debug.contains("hunter2"));
    }
}
