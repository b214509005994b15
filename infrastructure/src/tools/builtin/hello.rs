use async_trait::async_trait;
use linodemcp_application::ports::tool_handler::ToolHandler;
use linodemcp_domain::tool::{ToolError, ToolOutput, object_schema};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::{arguments_object, check_cancelled, json_kind};

const DEFAULT_NAME: &str = "World";

/// Greeting tool, mostly useful as a connectivity probe for clients.
pub struct HelloTool {
    server_name: String,
}

impl HelloTool {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for HelloTool {
    fn name(&self) -> &str {
        "hello"
    }

    fn description(&self) -> &str {
        "Say hello and report which server answered"
    }

    fn input_schema(&self) -> Value {
        object_schema(
            json!({
                "name": {
                    "type": "string",
                    "description": "Name to greet (defaults to World)"
                }
            }),
            &[],
        )
    }

    async fn execute(&self, cancel: CancellationToken, arguments: Value) -> Result<ToolOutput, ToolError> {
        check_cancelled(&cancel)?;

        let name = match arguments_object(&arguments)?.and_then(|args| args.get("name")) {
            None | Some(Value::Null) => DEFAULT_NAME,
            Some(Value::String(name)) if name.trim().is_empty() => DEFAULT_NAME,
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(ToolError::invalid_params(format!(
                    "'name' must be a string, got {}",
                    json_kind(other)
                )));
            }
        };

        Ok(ToolOutput::text(format!(
            "Hello, {}! Welcome to {}.",
            name, self.server_name
        )))
    }
}
