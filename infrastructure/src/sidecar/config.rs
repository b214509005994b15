//! Sidecar settings
//!
//! | Setting | Default | Source |
//! |---------|---------|--------|
//! | host | `127.0.0.1` | fixed |
//! | port | `9090` | `system.metrics_port` / `METRICS_PORT` |
//! | metrics enabled | `true` | `system.enable_metrics` / `ENABLE_METRICS` |
//! | basic auth | off | `METRICS_AUTH_USERNAME` + `METRICS_AUTH_PASSWORD` |
//! | TLS | off | `METRICS_TLS_ENABLED`, `METRICS_TLS_CERT_FILE`, `METRICS_TLS_KEY_FILE` |
//! | rate limit | 10/s, burst 20 | fixed |
//! | shutdown timeout | 5 s | fixed |
//! | deep-health probe timeout | 2 s | fixed |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use linodemcp_application::DEFAULT_PROBE_TIMEOUT;
use linodemcp_domain::config::SystemSettings;

use super::error::SidecarError;
use crate::config::EnvOverrides;

pub const DEFAULT_REFILL_PER_SECOND: f64 = 10.0;
pub const DEFAULT_BURST: u32 = 20;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP Basic credentials guarding the scrape and deep-health paths.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

impl BasicAuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// PEM certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSettings {
    pub refill_per_second: f64,
    pub burst: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            burst: DEFAULT_BURST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SidecarConfig {
    pub service_name: String,
    pub service_version: String,
    pub host: IpAddr,
    pub port: u16,
    /// When false `/metrics` answers 503 and health reports degraded
    pub metrics_enabled: bool,
    pub basic_auth: Option<BasicAuthCredentials>,
    pub tls: Option<TlsFiles>,
    pub rate_limit: RateLimitSettings,
    pub shutdown_timeout: Duration,
    pub probe_timeout: Duration,
}

impl SidecarConfig {
    /// Settings on loopback with defaults; fails if `port` is not a TCP port.
    pub fn new(service_name: impl Into<String>, port: i64) -> Result<Self, SidecarError> {
        let port = u16::try_from(port).map_err(|_| SidecarError::InvalidPort(port))?;
        Ok(Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            metrics_enabled: true,
            basic_auth: None,
            tls: None,
            rate_limit: RateLimitSettings::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    /// Effective settings (file plus environment) and the sidecar-only
    /// environment knobs.
    pub fn from_settings(settings: &SystemSettings, env: &EnvOverrides) -> Result<Self, SidecarError> {
        let mut config = Self::new(settings.server_name.clone(), i64::from(settings.metrics_port))?;
        config.metrics_enabled = settings.enable_metrics;

        if let (Some(username), Some(password)) = (&env.metrics_auth_username, &env.metrics_auth_password)
            && !username.is_empty()
            && !password.is_empty()
        {
            config.basic_auth = Some(BasicAuthCredentials::new(username, password));
        }

        if env.tls_enabled() {
            let cert = env.metrics_tls_cert_file.as_deref().unwrap_or_default();
            let key = env.metrics_tls_key_file.as_deref().unwrap_or_default();
            if cert.is_empty() || key.is_empty() {
                return Err(SidecarError::TlsConfig(
                    "METRICS_TLS_ENABLED requires METRICS_TLS_CERT_FILE and METRICS_TLS_KEY_FILE".to_string(),
                ));
            }
            config.tls = Some(TlsFiles {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            });
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_metrics_enabled(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn with_basic_auth(mut self, credentials: BasicAuthCredentials) -> Self {
        self.basic_auth = Some(credentials);
        self
    }

    pub fn with_tls(mut self, files: TlsFiles) -> Self {
        self.tls = Some(files);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitSettings) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_range_checked() {
        assert!(SidecarConfig::new("svc", 0).is_ok());
        assert!(SidecarConfig::new("svc", 65535).is_ok());
        assert!(matches!(
            SidecarConfig::new("svc", 65536),
            Err(SidecarError::InvalidPort(65536))
        ));
        assert!(matches!(
            SidecarConfig::new("svc", -1),
            Err(SidecarError::InvalidPort(-1))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = SidecarConfig::new("svc", 9090).unwrap();
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(config.metrics_enabled);
        assert!(config.basic_auth.is_none());
        assert!(!config.tls_enabled());
        assert_eq!(config.rate_limit.burst, DEFAULT_BURST);
        assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
    }

    #[test]
    fn test_from_settings_needs_both_credentials() {
        let settings = SystemSettings::default();
        let env = EnvOverrides {
            metrics_auth_username: Some("scraper".to_string()),
            ..EnvOverrides::default()
        };
        let config = SidecarConfig::from_settings(&settings, &env).unwrap();
        assert!(config.basic_auth.is_none());

        let env = EnvOverrides {
            metrics_auth_username: Some("scraper".to_string()),
            metrics_auth_password: Some("hunter2".to_string()),
            ..EnvOverrides::default()
        };
        let config = SidecarConfig::from_settings(&settings, &env).unwrap();
        assert_eq!(config.basic_auth.unwrap().username, "scraper");
    }

    #[test]
    fn test_from_settings_tls_requires_paths() {
        let settings = SystemSettings::default();
        let env = EnvOverrides {
            metrics_tls_enabled: Some(true),
            ..EnvOverrides::default()
        };
        assert!(matches!(
            SidecarConfig::from_settings(&settings, &env),
            Err(SidecarError::TlsConfig(_))
        ));

        let env = EnvOverrides {
            metrics_tls_enabled: Some(true),
            metrics_tls_cert_file: Some("/etc/linodemcp/cert.pem".to_string()),
            metrics_tls_key_file: Some("/etc/linodemcp/key.pem".to_string()),
            ..EnvOverrides::default()
        };
        let config = SidecarConfig::from_settings(&settings, &env).unwrap();
        assert!(config.tls_enabled());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = BasicAuthCredentials::new("scraper", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("scraper"));
        assert!(!debug.contains("hunter2"));
    }
}
