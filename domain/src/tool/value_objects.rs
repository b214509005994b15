//! Tool domain value objects: handler output and handler errors
//!
//! A successful invocation yields a [`ToolOutput`], a list of typed
//! [`ContentBlock`]s plus an optional `isError` flag, serialized verbatim as
//! the `result` of a `tools/call` response. A failed invocation yields a
//! [`ToolError`], which the dispatcher maps onto a JSON-RPC error code:
//!
//! | Variant | JSON-RPC code |
//! |---------|---------------|
//! | `InvalidParams` | `-32602` |
//! | `Failed` | `-32603` |
//! | `Cancelled` | `-32000` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One typed block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
        }
    }
}

/// Result payload of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    /// Set when the tool ran but reports a domain-level failure in `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: None,
        }
    }

    /// Pretty-printed JSON rendered as a single text block.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| ToolError::Failed(format!("failed to encode tool output: {}", e)))?;
        Ok(Self::text(text))
    }

    /// Output flagged as a tool-level error.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// All text blocks joined with newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Declared failure of a tool handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("tool failed: {0}")]
    Failed(String),

    #[error("cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        ToolError::InvalidParams(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ToolError::Failed(message.into())
    }

    /// Short machine-readable outcome label used for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            ToolError::InvalidParams(_) => "invalid_params",
            ToolError::Failed(_) => "failed",
            ToolError::Cancelled => "cancelled",
        }
    }
}
