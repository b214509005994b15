//! Tool Handler port
//!
//! The executable half of a tool. The registry stores handlers behind
//! `Arc<dyn ToolHandler>` and the dispatcher invokes them with the
//! request's cancellation token and `params.arguments`.

use async_trait::async_trait;
use linodemcp_domain::tool::{ToolDescriptor, ToolError, ToolOutput};
use tokio_util::sync::CancellationToken;

/// Capability set of a callable tool.
///
/// Implementations must return [`ToolError::Cancelled`] promptly once
/// `cancel` fires, and must return the same `input_schema` on every call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Registry key, e.g. `"hello"`
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-Schema-shaped description of `arguments`
    fn input_schema(&self) -> serde_json::Value;

    /// Run the tool.
    async fn execute(
        &self,
        cancel: CancellationToken,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolError>;

    /// Metadata view used by `tools/list`.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.input_schema())
    }
}
