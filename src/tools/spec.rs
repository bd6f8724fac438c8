//! Tool specification traits for exposing the command pipeline to an agent.
//!
//! This module defines the core abstractions for tools:
//! - `ToolSpec`: The trait every tool implements
//! - `ToolContext`: Execution context passed to tools
//! - `ToolResult`: Unified result type for tool execution
//! - `ToolCapability`: Capabilities and requirements of tools

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Capabilities that a tool may have or require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolCapability {
    /// Tool only reads site state
    ReadOnly,
    /// Tool may change site state (options, plugin activation)
    ModifiesSite,
    /// Tool may spawn `wp` or `php` processes
    ExecutesCode,
}

/// Approval level required for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalLevel {
    /// Never needs approval
    #[default]
    Auto,
    /// Suggest approval but allow user to skip
    Suggest,
    /// Always require explicit user approval
    Required,
}

/// Errors that can occur during tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Failed to validate input: {message}")]
    InvalidInput { message: String },

    #[error("Failed to validate input: missing required field '{field}'")]
    MissingField { field: String },

    #[error("Failed to execute tool: {message}")]
    ExecutionFailed { message: String },

    #[error("Failed to locate tool: {message}")]
    NotAvailable { message: String },
}

impl ToolError {
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn not_available(msg: impl Into<String>) -> Self {
        Self::NotAvailable {
            message: msg.into(),
        }
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output content shown to the model
    pub content: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Optional structured metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResult {
    /// Create a successful result with content.
    #[must_use]
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
            metadata: None,
        }
    }

    /// Create an error result with message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            success: false,
            metadata: None,
        }
    }

    /// Add metadata to the result.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Context passed to tools during execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Parameters applied to every call unless the tool input overrides them
    pub default_parameters: Map<String, Value>,
}

impl ToolContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a default parameter, e.g. `timeout`.
    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.default_parameters.insert(key.into(), value);
        self
    }
}

/// The core trait that all tools must implement.
#[async_trait]
pub trait ToolSpec: Send + Sync {
    /// Returns the unique name of this tool (used in API calls).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> Value;

    /// Returns the capabilities this tool has.
    fn capabilities(&self) -> Vec<ToolCapability>;

    /// Returns the approval level required for this tool.
    fn approval_level(&self) -> ApprovalLevel {
        let caps = self.capabilities();
        if caps.contains(&ToolCapability::ExecutesCode) {
            ApprovalLevel::Suggest
        } else if caps.contains(&ToolCapability::ModifiesSite) {
            ApprovalLevel::Required
        } else {
            ApprovalLevel::Auto
        }
    }

    /// Returns whether this tool is read-only.
    fn is_read_only(&self) -> bool {
        let caps = self.capabilities();
        caps.contains(&ToolCapability::ReadOnly)
            && !caps.contains(&ToolCapability::ModifiesSite)
            && !caps.contains(&ToolCapability::ExecutesCode)
    }

    /// Execute the tool with the given input and context.
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolResult, ToolError>;
}

// === Helper functions for extracting values from JSON input ===

/// Helper to extract required string field from JSON input.
pub fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::missing_field(field))
}

/// Helper to extract an optional object field. A present non-object is an error.
pub fn optional_object(input: &Value, field: &str) -> Result<Map<String, Value>, ToolError> {
    match input.get(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ToolError::invalid_input(format!(
            "'{field}' must be an object"
        ))),
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("hello");
        assert!(result.success);
        assert_eq!(result.content, "hello");
        assert!(result.metadata.is_none());
    }

    #[test]
    fn test_tool_result_error_with_metadata() {
        let result = ToolResult::error("blocked").with_metadata(json!({"success": false}));
        assert!(!result.success);
        assert!(result.metadata.is_some());
    }

    #[test]
    fn test_required_str() {
        let input = json!({"command": "wp plugin list", "count": 42});
        assert_eq!(required_str(&input, "command").unwrap(), "wp plugin list");
        assert!(required_str(&input, "missing").is_err());
        assert!(required_str(&input, "count").is_err());
    }

    #[test]
    fn test_optional_object() {
        let input = json!({"parameters": {"status": "active"}, "bad": 3});
        assert_eq!(optional_object(&input, "parameters").unwrap()["status"], json!("active"));
        assert!(optional_object(&input, "missing").unwrap().is_empty());
        assert!(optional_object(&input, "bad").is_err());
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::missing_field("command");
        assert_eq!(
            format!("{err}"),
            "Failed to validate input: missing required field 'command'"
        );
    }

    #[test]
    fn test_context_defaults() {
        let ctx = ToolContext::new().with_default("timeout", json!(20));
        assert_eq!(ctx.default_parameters["timeout"], json!(20));
        assert_eq!(ApprovalLevel::default(), ApprovalLevel::Auto);
    }

    struct Caps(Vec<ToolCapability>);

    #[async_trait]
    impl ToolSpec for Caps {
        fn name(&self) -> &str {
            "caps"
        }

        fn description(&self) -> &str {
            ""
        }

        fn input_schema(&self) -> Value {
            json!({})
        }

        fn capabilities(&self) -> Vec<ToolCapability> {
            self.0.clone()
        }

        async fn execute(&self, _input: Value, _context: &ToolContext) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success(""))
        }
    }

    #[test]
    fn test_approval_follows_capabilities() {
        use ToolCapability::{ExecutesCode, ModifiesSite, ReadOnly};

        let reader = Caps(vec![ReadOnly]);
        assert_eq!(reader.approval_level(), ApprovalLevel::Auto);
        assert!(reader.is_read_only());

        let writer = Caps(vec![ModifiesSite]);
        assert_eq!(writer.approval_level(), ApprovalLevel::Required);
        assert!(!writer.is_read_only());

        let runner = Caps(vec![ReadOnly, ExecutesCode]);
        assert_eq!(runner.approval_level(), ApprovalLevel::Suggest);
        assert!(!runner.is_read_only());
    }
}
