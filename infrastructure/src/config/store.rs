//! Multi-account configuration store
//!
//! [`ConfigManager`] owns the live [`ConfigDocument`] and its file. Readers
//! take the lock shared and receive deep copies. Every mutator holds the
//! lock exclusively across clone, apply, validate, persist and swap, so a
//! failed mutation leaves both memory and disk untouched.
//!
//! Files are written atomically: a temp file in the target directory is
//! written, restricted to the owner, synced and renamed over the target.

use super::loader::ConfigLoader;
use linodemcp_application::ports::config_reader::ConfigReader;
use linodemcp_domain::config::{
    AccountRecord, ConfigDocument, ConfigError, validate_account, validate_document,
};
use linodemcp_domain::credentials::{TokenRule, validate_token};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[cfg(unix)]
const FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const DIR_MODE: u32 = 0o750;

pub struct ConfigManager {
    path: PathBuf,
    document: RwLock<ConfigDocument>,
    version: AtomicU64,
}

impl ConfigManager {
    /// Load the document at `path`, or create and persist the defaults if
    /// the file does not exist.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        check_path_safety(&path)?;

        let document = match std::fs::metadata(&path) {
            Ok(_) => ConfigLoader::read(&path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = ConfigDocument::defaults();
                persist(&path, &doc)?;
                info!(path = %path.display(), "Created default configuration");
                doc
            }
            Err(e) => return Err(ConfigError::io(&path, e)),
        };

        debug!(
            path = %path.display(),
            accounts = document.accounts.len(),
            "Configuration loaded"
        );

        Ok(Self {
            path,
            document: RwLock::new(document),
            version: AtomicU64::new(1),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Monotonic counter, bumped on every successful mutation or reload.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Deep copy of the current document.
    pub fn snapshot(&self) -> ConfigDocument {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Copy of one account record.
    pub fn account(&self, name: &str) -> Option<AccountRecord> {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .account(name)
            .cloned()
    }

    pub fn add_account(&self, name: &str, record: AccountRecord) -> Result<(), ConfigError> {
        self.mutate(|doc| {
            if doc.accounts.contains_key(name) {
                return Err(ConfigError::AccountExists(name.to_string()));
            }
            validate_account(name, &record)?;
            warn_on_token_format(name, &record);
            doc.accounts.insert(name.to_string(), record);
            Ok(())
        })?;
        info!(account = %name, "Account added");
        Ok(())
    }

    pub fn update_account(&self, name: &str, record: AccountRecord) -> Result<(), ConfigError> {
        self.mutate(|doc| {
            let Some(slot) = doc.accounts.get_mut(name) else {
                return Err(ConfigError::AccountMissing(name.to_string()));
            };
            validate_account(name, &record)?;
            warn_on_token_format(name, &record);
            *slot = record;
            Ok(())
        })?;
        info!(account = %name, "Account updated");
        Ok(())
    }

    pub fn remove_account(&self, name: &str) -> Result<(), ConfigError> {
        self.mutate(|doc| {
            if !doc.accounts.contains_key(name) {
                return Err(ConfigError::AccountMissing(name.to_string()));
            }
            if doc.system.default_account == name {
                return Err(ConfigError::DefaultAccountLocked(name.to_string()));
            }
            doc.accounts.remove(name);
            Ok(())
        })?;
        info!(account = %name, "Account removed");
        Ok(())
    }

    pub fn set_default_account(&self, name: &str) -> Result<(), ConfigError> {
        self.mutate(|doc| {
            if !doc.accounts.contains_key(name) {
                return Err(ConfigError::AccountMissing(name.to_string()));
            }
            doc.system.default_account = name.to_string();
            Ok(())
        })?;
        info!(account = %name, "Default account set");
        Ok(())
    }

    /// Rewrite the file from the in-memory document.
    pub fn save(&self) -> Result<(), ConfigError> {
        let guard = self.write_lock();
        persist(&self.path, &guard)
    }

    /// Replace the in-memory document with the file's content. On any
    /// failure the prior document stays live.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let mut guard = self.write_lock();
        let fresh = ConfigLoader::read(&self.path).inspect_err(|e| {
            warn!(
                path = %self.path.display(),
                kind = e.kind(),
                error = %e,
                "Reload failed, keeping previous configuration"
            );
        })?;
        *guard = fresh;
        self.version.fetch_add(1, Ordering::AcqRel);
        info!(path = %self.path.display(), "Configuration reloaded");
        Ok(())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ConfigDocument> {
        self.document.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<F>(&self, apply: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<(), ConfigError>,
    {
        let mut guard = self.write_lock();
        let mut candidate = guard.clone();
        apply(&mut candidate)?;
        validate_document(&candidate)?;
        persist(&self.path, &candidate)?;
        *guard = candidate;
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl ConfigReader for ConfigManager {
    fn snapshot(&self) -> ConfigDocument {
        ConfigManager::snapshot(self)
    }
}

fn warn_on_token_format(name: &str, record: &AccountRecord) {
    let validation = validate_token(&record.token, &TokenRule::provider_token());
    if !validation.valid {
        warn!(
            account = %name,
            token = %validation.redacted_form,
            reason = validation.reason.map(|r| r.as_str()).unwrap_or("unknown"),
            "Account token does not look like a provider token"
        );
    }
}

/// Reject `..` traversal unless the path stays under the user's config
/// directory or the temp directory.
pub fn check_path_safety(path: &Path) -> Result<(), ConfigError> {
    let has_parent = path.components().any(|c| matches!(c, Component::ParentDir));
    if !has_parent {
        return Ok(());
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| ConfigError::io(path, e))?
            .join(path)
    };
    let normalized = normalize(&absolute);

    let allowed = [dirs::config_dir(), Some(std::env::temp_dir())];
    let inside = allowed
        .iter()
        .flatten()
        .any(|root| normalized.starts_with(normalize(root)));

    if inside {
        Ok(())
    } else {
        Err(ConfigError::PathUnsafe(path.to_path_buf()))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn persist(path: &Path, doc: &ConfigDocument) -> Result<(), ConfigError> {
    check_path_safety(path)?;
    let text = ConfigLoader::render(doc)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    create_config_dir(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| ConfigError::io(&dir, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| ConfigError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(FILE_MODE))
            .map_err(|e| ConfigError::io(tmp.path(), e))?;
    }

    tmp.as_file()
        .sync_all()
        .map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;

    debug!(path = %path.display(), "Configuration written");
    Ok(())
}

fn create_config_dir(dir: &Path) -> Result<(), ConfigError> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir).map_err(|e| ConfigError::io(dir, e))
}
