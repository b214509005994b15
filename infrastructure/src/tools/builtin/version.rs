use async_trait::async_trait;
use linodemcp_application::ports::tool_handler::ToolHandler;
use linodemcp_domain::tool::{ToolError, ToolOutput, object_schema};
use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::check_cancelled;

/// Build identity reported by the `version` tool and the sidecar root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: String,
    pub version: String,
    pub os: &'static str,
    pub arch: &'static str,
}

impl BuildInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    /// Identity of this workspace build.
    pub fn current(name: impl Into<String>) -> Self {
        Self::new(name, env!("CARGO_PKG_VERSION"))
    }
}

pub struct VersionTool {
    info: BuildInfo,
}

impl VersionTool {
    pub fn new(info: BuildInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl ToolHandler for VersionTool {
    fn name(&self) -> &str {
        "version"
    }

    fn description(&self) -> &str {
        "Report the server name, version and target platform"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn execute(&self, cancel: CancellationToken, _arguments: Value) -> Result<ToolOutput, ToolError> {
        check_cancelled(&cancel)?;
        ToolOutput::json(&self.info)
    }
}
