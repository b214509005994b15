//! Error types for the JSON-RPC dispatcher
//!
//! [`DispatchError`] is everything that becomes a JSON-RPC `error` object;
//! [`TransportError`] is failure of the stream itself.

use linodemcp_domain::credentials::scrub_secrets;
use linodemcp_domain::tool::ToolError;
use serde_json::json;
use thiserror::Error;

use super::protocol::RpcError;

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SERVER_ERROR: i64 = -32000;

/// Request-level failures, each mapped to a JSON-RPC error code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("parse error: {0}")]
    RequestMalformed(String),

    #[error("invalid request: {0}")]
    RequestInvalid(String),

    #[error("method not found: {0}")]
    RequestMethodUnknown(String),

    #[error("tool unknown: {0}")]
    ToolUnknown(String),

    #[error("invalid params: {0}")]
    RequestParamsInvalid(String),

    /// Built through [`DispatchError::handler_failed`] so the reason is scrubbed.
    #[error("internal error: {0}")]
    HandlerFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("server shutting down")]
    ShuttingDown,
}

impl DispatchError {
    /// Handler failure with any token-like substrings redacted.
    pub fn handler_failed(reason: impl AsRef<str>) -> Self {
        DispatchError::HandlerFailed(scrub_secrets(reason.as_ref()))
    }

    pub fn code(&self) -> i64 {
        match self {
            DispatchError::RequestMalformed(_) => PARSE_ERROR,
            DispatchError::RequestInvalid(_) => INVALID_REQUEST,
            DispatchError::RequestMethodUnknown(_) | DispatchError::ToolUnknown(_) => {
                METHOD_NOT_FOUND
            }
            DispatchError::RequestParamsInvalid(_) => INVALID_PARAMS,
            DispatchError::HandlerFailed(_) => INTERNAL_ERROR,
            DispatchError::Cancelled | DispatchError::ShuttingDown => SERVER_ERROR,
        }
    }

    /// Outcome label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::RequestMalformed(_) => "malformed",
            DispatchError::RequestInvalid(_) => "invalid_request",
            DispatchError::RequestMethodUnknown(_) => "method_unknown",
            DispatchError::ToolUnknown(_) => "tool_unknown",
            DispatchError::RequestParamsInvalid(_) => "invalid_params",
            DispatchError::HandlerFailed(_) => "failed",
            DispatchError::Cancelled => "cancelled",
            DispatchError::ShuttingDown => "shutting_down",
        }
    }

    pub fn to_rpc_error(&self) -> RpcError {
        let data = match self {
            DispatchError::ToolUnknown(name) => Some(json!({ "toolName": name })),
            DispatchError::RequestMethodUnknown(method) => Some(json!({ "method": method })),
            _ => None,
        };
        RpcError {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }
}

impl From<ToolError> for DispatchError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidParams(reason) => DispatchError::RequestParamsInvalid(reason),
            ToolError::Failed(reason) => DispatchError::handler_failed(reason),
            ToolError::Cancelled => DispatchError::Cancelled,
        }
    }
}

/// Failure of the underlying byte stream
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("writer task failed: {0}")]
    WriterTask(String),
}
