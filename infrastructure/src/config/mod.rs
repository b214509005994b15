//! Configuration file handling for linodemcp
//!
//! - [`ConfigLoader`]: parses the TOML file (through `figment`) into a
//!   validated `ConfigDocument`
//! - [`ConfigManager`]: owns the live document, serializes mutations and
//!   writes the file atomically
//! - [`EnvOverrides`]: environment variables applied to the effective
//!   runtime settings, never persisted

mod file_config;
mod loader;
mod store;

pub use file_config::{FileAccountConfig, FileConfig, FileSystemConfig};
pub use loader::{APP_DIR, CONFIG_FILE, ConfigLoader, ENV_KEYS, EnvOverrides};
pub use store::{ConfigManager, check_path_safety};
