//! Site tools: `wp_cli` and `site_query`, both backed by the command handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::commands::result::merge_parameters;
use crate::commands::{CommandHandler, ExecutionResult, Parameters};
use crate::logging::{self, Category};

use super::spec::{
    ToolCapability, ToolContext, ToolError, ToolResult, ToolSpec, optional_object, required_str,
};

/// Run `f` against the handler off the async runtime.
async fn run_blocking<F>(handler: &Arc<CommandHandler>, f: F) -> Result<ExecutionResult, ToolError>
where
    F: FnOnce(&CommandHandler) -> ExecutionResult + Send + 'static,
{
    let handler = Arc::clone(handler);
    tokio::task::spawn_blocking(move || f(&handler))
        .await
        .map_err(|e| ToolError::execution_failed(format!("command task failed: {e}")))
}

fn parameters(input: &Value, context: &ToolContext) -> Result<Parameters, ToolError> {
    let given = optional_object(input, "parameters")?;
    Ok(merge_parameters(&context.default_parameters, &given))
}

fn to_tool_result(result: &ExecutionResult) -> ToolResult {
    let content = match (&result.error, result.output.is_empty()) {
        (Some(error), true) => error.clone(),
        _ => result.output.clone(),
    };
    let tool_result = if result.success {
        ToolResult::success(content)
    } else {
        ToolResult::error(content)
    };
    tool_result.with_metadata(serde_json::to_value(result).unwrap_or(Value::Null))
}

// === WpCliTool ===

/// Runs an explicit WP-CLI or PHP command.
pub struct WpCliTool {
    handler: Arc<CommandHandler>,
}

impl WpCliTool {
    #[must_use]
    pub fn new(handler: Arc<CommandHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl ToolSpec for WpCliTool {
    fn name(&self) -> &'static str {
        "wp_cli"
    }

    fn description(&self) -> &'static str {
        "Run a WP-CLI command (e.g. `wp plugin list --status=active`) or a PHP version \
         query against the site. Dangerous commands are refused. When shell execution \
         is unavailable, common read commands are answered through the WordPress API."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command to run, e.g. `wp plugin list`"
                },
                "parameters": {
                    "type": "object",
                    "description": "Optional parameters: timeout, format (json|array), status, role, days, limit"
                }
            },
            "required": ["command"]
        })
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        vec![ToolCapability::ExecutesCode, ToolCapability::ModifiesSite]
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError> {
        let command = required_str(&input, "command")?.to_string();
        let parameters = parameters(&input, context)?;
        logging::debug(Category::Adapter, format!("wp_cli tool invoked: {command}"));

        let result = run_blocking(&self.handler, move |handler| {
            handler.execute_command(command, parameters)
        })
        .await?;
        Ok(to_tool_result(&result))
    }
}

// === SiteQueryTool ===

/// Answers a natural-language question about the site.
pub struct SiteQueryTool {
    handler: Arc<CommandHandler>,
}

impl SiteQueryTool {
    #[must_use]
    pub fn new(handler: Arc<CommandHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl ToolSpec for SiteQueryTool {
    fn name(&self) -> &'static str {
        "site_query"
    }

    fn description(&self) -> &'static str {
        "Answer a plain-language question about the site, such as \"which plugins are \
         active?\" or \"what PHP version is running?\". Fails with `No command detected` \
         when the question maps to no known command."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The user's question"
                },
                "parameters": {
                    "type": "object",
                    "description": "Optional parameters merged over the detected ones"
                }
            },
            "required": ["message"]
        })
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        vec![ToolCapability::ReadOnly, ToolCapability::ExecutesCode]
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError> {
        let message = required_str(&input, "message")?.to_string();
        let parameters = parameters(&input, context)?;

        let result = run_blocking(&self.handler, move |handler| {
            handler.process_request(&message, parameters)
        })
        .await?;
        Ok(to_tool_result(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SystemRunner;
    use crate::site::InMemorySite;

    fn handler() -> Arc<CommandHandler> {
        let site = Arc::new(InMemorySite::sample());
        Arc::new(
            CommandHandler::builder(site)
                .runner(Arc::new(SystemRunner::disabled()))
                .build(),
        )
    }

    #[tokio::test]
    async fn test_wp_cli_tool_lists_plugins() {
        let tool = WpCliTool::new(handler());
        let result = tool
            .execute(json!({"command": "wp plugin list"}), &ToolContext::new())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.content.contains("akismet"));
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata["method"], json!("wp_api"));
        assert_eq!(metadata["command_type"], json!("plugin_list"));
    }

    #[tokio::test]
    async fn test_wp_cli_tool_requires_command() {
        let tool = WpCliTool::new(handler());
        let err = tool.execute(json!({}), &ToolContext::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingField { .. }));

        let err = tool
            .execute(json!({"command": "wp plugin list", "parameters": 5}), &ToolContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_wp_cli_tool_reports_blocked_command() {
        let tool = WpCliTool::new(handler());
        let result = tool
            .execute(json!({"command": "wp db drop --yes"}), &ToolContext::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.metadata.unwrap()["success"], json!(false));
    }

    #[tokio::test]
    async fn test_site_query_tool_miss() {
        let tool = SiteQueryTool::new(handler());
        let result = tool
            .execute(json!({"message": "tell me a joke"}), &ToolContext::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.metadata.unwrap()["error"], json!("No command detected"));
    }

    #[tokio::test]
    async fn test_context_defaults_sit_under_input() {
        let tool = WpCliTool::new(handler());
        let context = ToolContext::new().with_default("status", json!("inactive"));
        let result = tool
            .execute(json!({"command": "wp plugin list"}), &context)
            .await
            .unwrap();
        assert!(result.content.contains("hello"));
        assert!(!result.content.contains("akismet"));

        let result = tool
            .execute(
                json!({"command": "wp plugin list", "parameters": {"status": "active"}}),
                &context,
            )
            .await
            .unwrap();
        assert!(result.content.contains("akismet"));
    }
}
