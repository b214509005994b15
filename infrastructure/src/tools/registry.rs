//! Tool Registry
//!
//! The [`ToolRegistry`] maps tool names to [`ToolHandler`]s. Registration
//! validates the handler's descriptor; lookups and enumeration take a shared
//! lock, so `tools/list` always sees a point-in-time snapshot even while a
//! registration races it.
//!
//! # Usage
//!
//! ```ignore
//! use linodemcp_infrastructure::tools::{ToolRegistry, HelloTool};
//!
//! let registry = ToolRegistry::new();
//! registry.register(Arc::new(HelloTool::new("linodemcp")))?;
//!
//! assert!(registry.has("hello"));
//! let handler = registry.lookup("hello")?;
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use linodemcp_application::ports::tool_handler::ToolHandler;
use linodemcp_domain::tool::{ToolDescriptor, ToolDescriptorError};
use thiserror::Error;

/// Registry-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    ToolDuplicate(String),

    #[error(transparent)]
    ToolInvalid(#[from] ToolDescriptorError),

    #[error("tool '{0}' is not registered")]
    ToolUnknown(String),
}

/// Thread-safe catalog of tool handlers, ordered by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name.
    pub fn register(&self, handler: Arc<dyn ToolHandler>) -> Result<(), RegistryError> {
        let descriptor = handler.descriptor();
        descriptor.validate()?;

        // Schemas must be stable across calls.
        if handler.input_schema() != descriptor.input_schema {
            return Err(ToolDescriptorError::InvalidSchema {
                name: descriptor.name,
                reason: "schema changes between calls".to_string(),
            }
            .into());
        }

        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if tools.contains_key(&descriptor.name) {
            return Err(RegistryError::ToolDuplicate(descriptor.name));
        }
        tracing::debug!(tool = %descriptor.name, "Registered tool");
        tools.insert(descriptor.name, handler);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn ToolHandler>, RegistryError> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ToolUnknown(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Descriptors of all tools, sorted by name.
    pub fn enumerate(&self) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|handler| handler.descriptor())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
