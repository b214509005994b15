//! Configuration validation rules.
//!
//! [`validate_document`] is the single gate every loaded or mutated document
//! passes before it becomes visible. [`validate_account`] is the narrower
//! check applied by `AddAccount` / `UpdateAccount`.

use url::Url;

use super::entities::{AccountRecord, ConfigDocument, SystemSettings};
use super::error::ConfigError;

/// Validate a complete document.
pub fn validate_document(doc: &ConfigDocument) -> Result<(), ConfigError> {
    validate_system(&doc.system)?;

    for (name, record) in &doc.accounts {
        validate_account_name(name)?;
        if !record.is_unset() && !record.is_complete() {
            return Err(ConfigError::Validate(format!(
                "account.{}: token and label must both be set or both be empty",
                name
            )));
        }
        validate_apiurl(name, record)?;
    }

    let default = &doc.system.default_account;
    if !default.is_empty() && !doc.accounts.contains_key(default) {
        return Err(ConfigError::Validate(format!(
            "system.default_account: '{}' does not name a configured account",
            default
        )));
    }

    Ok(())
}

fn validate_system(system: &SystemSettings) -> Result<(), ConfigError> {
    if system.server_name.trim().is_empty() {
        return Err(ConfigError::Validate(
            "system.server_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate a record supplied to `AddAccount` / `UpdateAccount`.
///
/// Unlike the document check, a mutation must carry both token and label.
pub fn validate_account(name: &str, record: &AccountRecord) -> Result<(), ConfigError> {
    validate_account_name(name)?;
    if record.token.trim().is_empty() {
        return Err(ConfigError::AccountInvalid {
            name: name.to_string(),
            reason: "token must not be empty".to_string(),
        });
    }
    if record.label.trim().is_empty() {
        return Err(ConfigError::AccountInvalid {
            name: name.to_string(),
            reason: "label must not be empty".to_string(),
        });
    }
    validate_apiurl(name, record)
}

fn validate_account_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::AccountInvalid {
            name: name.to_string(),
            reason: "name must be non-empty and use only letters, digits, '_' or '-'".to_string(),
        })
    }
}

fn validate_apiurl(name: &str, record: &AccountRecord) -> Result<(), ConfigError> {
    let Some(apiurl) = record.apiurl.as_deref() else {
        return Ok(());
    };
    if apiurl.is_empty() {
        return Ok(());
    }
    match Url::parse(apiurl) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(ConfigError::AccountInvalid {
            name: name.to_string(),
            reason: format!("apiurl scheme '{}' is not http or https", url.scheme()),
        }),
        Err(e) => Err(ConfigError::AccountInvalid {
            name: name.to_string(),
            reason: format!("apiurl is not a valid URL: {}", e),
        }),
    }
}
