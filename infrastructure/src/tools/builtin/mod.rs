//! Built-in tools
//!
//! In-process handlers registered at startup. Provider-bound tools are
//! registered alongside them through the same `ToolHandler` port.
//!
//! | Tool | Input | Output |
//! |------|-------|--------|
//! | `hello` | `{name?: string}` | greeting text |
//! | `version` | none | build identity as JSON |
//! | `health_check` | none | deep `HealthStatus` as JSON |
//! | `account_list` | none | configured accounts with redacted tokens |

mod account_list;
mod health_check;
mod hello;
mod version;

pub use account_list::AccountListTool;
pub use health_check::HealthCheckTool;
pub use hello::HelloTool;
pub use version::{BuildInfo, VersionTool};

use linodemcp_domain::tool::ToolError;
use tokio_util::sync::CancellationToken;

/// Return `Cancelled` if the token has fired.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), ToolError> {
    if cancel.is_cancelled() {
        Err(ToolError::Cancelled)
    } else {
        Ok(())
    }
}

/// Reject anything other than an object or null as `arguments`.
pub(crate) fn arguments_object(
    arguments: &serde_json::Value,
) -> Result<Option<&serde_json::Map<String, serde_json::Value>>, ToolError> {
    match arguments {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => Err(ToolError::invalid_params(format!(
            "arguments must be an object, got {}",
            json_kind(other)
        ))),
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

