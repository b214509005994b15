use async_trait::async_trait;
use linodemcp_application::ports::config_reader::ConfigReader;
use linodemcp_application::ports::tool_handler::ToolHandler;
use linodemcp_domain::tool::{ToolError, ToolOutput, object_schema};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::check_cancelled;

/// One row of `account_list` output. Never carries the raw token.
#[derive(Debug, Serialize)]
struct AccountSummary {
    name: String,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    apiurl: Option<String>,
    token: String,
    default: bool,
}

/// Lists configured accounts through the config reader port.
pub struct AccountListTool {
    config: Arc<dyn ConfigReader>,
}

impl AccountListTool {
    pub fn new(config: Arc<dyn ConfigReader>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ToolHandler for AccountListTool {
    fn name(&self) -> &str {
        "account_list"
    }

    fn description(&self) -> &str {
        "List configured provider accounts with redacted credentials"
    }

    fn input_schema(&self) -> Value {
        object_schema(json!({}), &[])
    }

    async fn execute(&self, cancel: CancellationToken, _arguments: Value) -> Result<ToolOutput, ToolError> {
        check_cancelled(&cancel)?;

        let doc = self.config.snapshot();
        let accounts: Vec<AccountSummary> = doc
            .accounts
            .iter()
            .map(|(name, record)| AccountSummary {
                name: name.clone(),
                label: record.label.clone(),
                apiurl: record.apiurl.clone(),
                token: record.redacted_token(),
                default: *name == doc.system.default_account,
            })
            .collect();

        ToolOutput::json(&json!({
            "defaultAccount": doc.system.default_account,
            "accounts": accounts,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodemcp_application::ports::config_reader::StaticConfig;
    use linodemcp_domain::config::{AccountRecord, ConfigDocument};

    const TOKEN: &str = "abcdef123456789012345678901234567890abcd";

    #[tokio::test]
    async fn test_lists_accounts_without_raw_tokens() {
        let mut doc = ConfigDocument::defaults();
        doc.accounts
            .insert("primary".to_string(), AccountRecord::new(TOKEN, "Primary"));
        doc.accounts
            .insert("staging".to_string(), AccountRecord::new(TOKEN, "Staging"));
        doc.system.default_account = "primary".to_string();

        let tool = AccountListTool::new(Arc::new(StaticConfig(doc)));
        let output = tool.execute(CancellationToken::new(), json!({})).await.unwrap();
        let text = output.joined_text();
        assert!(!text.contains(TOKEN));

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["defaultAccount"], "primary");
        assert_eq!(parsed["accounts"][0]["name"], "primary");
        assert_eq!(parsed["accounts"][0]["default"], true);
        assert_eq!(parsed["accounts"][1]["default"], false);
        assert_eq!(parsed["accounts"][0]["token"], "abcd********************************abcd");
    }

    #[tokio::test]
    async fn test_empty_config() {
        let tool = AccountListTool::new(Arc::new(StaticConfig(ConfigDocument::defaults())));
        let output = tool.execute(CancellationToken::new(), Value::Null).await.unwrap();
        let parsed: Value = serde_json::from_str(&output.joined_text()).unwrap();
        assert_eq!(parsed["accounts"].as_array().unwrap().len(), 0);
    }
}
