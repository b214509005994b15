use async_trait::async_trait;
use linodemcp_application::ports::tool_handler::ToolHandler;
use linodemcp_application::use_cases::check_health::CheckHealthUseCase;
use linodemcp_domain::tool::{ToolError, ToolOutput, object_schema};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Deep health over the tool protocol. Shares its use case with the
/// sidecar's `/provider/health` endpoint.
pub struct HealthCheckTool {
    health: Arc<CheckHealthUseCase>,
}

impl HealthCheckTool {
    pub fn new(health: Arc<CheckHealthUseCase>) -> Self {
        Self { health }
    }
}

#[async_trait]
impl ToolHandler for HealthCheckTool {
    fn name(&self) -> &str {
        "health_check"
    }

    fn description(&self) -> &str {
        "Run the server's component health checks and report the aggregate status"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn execute(&self, cancel: CancellationToken, _arguments: Value) -> Result<ToolOutput, ToolError> {
        let status = tokio::select! {
            _ = cancel.cancelled() => return Err(ToolError::Cancelled),
            status = self.health.execute() => status,
        };
        ToolOutput::json(&status)
    }
}
