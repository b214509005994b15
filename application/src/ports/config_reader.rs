//! Config Reader port
//!
//! Read-only access to the live configuration document. Handlers receive
//! deep copies and never alias the store's internal state.

use linodemcp_domain::config::ConfigDocument;

pub trait ConfigReader: Send + Sync {
    /// Deep copy of the current document.
    fn snapshot(&self) -> ConfigDocument;
}

/// Fixed document, for wiring tools without a backing file.
pub struct StaticConfig(pub ConfigDocument);

impl ConfigReader for StaticConfig {
    fn snapshot(&self) -> ConfigDocument {
        self.0.clone()
    }
}
