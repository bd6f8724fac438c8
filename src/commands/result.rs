//! Result and request types shared by every pipeline component.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form command parameters (`timeout`, `format`, `status`, `days`, ...).
pub type Parameters = Map<String, Value>;

/// Output shown to the user whenever a command is refused.
pub const BLOCKED_OUTPUT: &str = "Command blocked for security reasons";

/// How a command was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMethod {
    /// A real `wp`/`php` process was spawned.
    Shell,
    /// Emulated through the WordPress API without spawning.
    WpApi,
}

/// The result contract every executor returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ExecutionMethod>,
    /// Table kind for the chat formatter, e.g. `plugin_list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<String>,
    /// Tab-separated table (header row first) for list commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Structured payload: decoded JSON, raw lines, or a summary map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ExecutionResult {
    #[must_use]
    pub fn success(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failure(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    /// An unexpected error, reported as `Error executing command: <message>`.
    #[must_use]
    pub fn error(command: impl Into<String>, message: impl std::fmt::Display) -> Self {
        let message = message.to_string();
        Self {
            success: false,
            output: format!("Error executing command: {message}"),
            error: Some(message),
            command: command.into(),
            ..Self::default()
        }
    }

    /// A security refusal. Never names the rule that matched.
    #[must_use]
    pub fn blocked(command: impl Into<String>) -> Self {
        Self {
            success: false,
            output: BLOCKED_OUTPUT.to_string(),
            error: Some("Command contains potentially dangerous operations".to_string()),
            command: command.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_return_code(mut self, code: Option<i32>) -> Self {
        self.return_code = code;
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: ExecutionMethod) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn with_command_type(mut self, command_type: impl Into<String>) -> Self {
        self.command_type = Some(command_type.into());
        self
    }

    #[must_use]
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A command as handed to [`CommandHandler::execute_command`](super::CommandHandler::execute_command).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CommandInput {
    Text(String),
    Structured {
        command: String,
        #[serde(default)]
        parameters: Parameters,
    },
}

impl From<&str> for CommandInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CommandInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// === Parameter helpers ===

/// String parameter, also accepting numbers.
#[must_use]
pub fn param_str(params: &Parameters, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unsigned parameter, also accepting numeric strings.
#[must_use]
pub fn param_u64(params: &Parameters, key: &str) -> Option<u64> {
    match params.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Overlay `overrides` on top of `base`.
#[must_use]
pub fn merge_parameters(base: &Parameters, overrides: &Parameters) -> Parameters {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_result_shape() {
        let result = ExecutionResult::error("wp foo", "boom");
        assert!(!result.success);
        assert_eq!(result.output, "Error executing command: boom");
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let result = ExecutionResult::success("wp core version", "6.6.2")
            .with_method(ExecutionMethod::WpApi);
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["method"], json!("wp_api"));
        assert!(value.get("return_code").is_none());
        assert!(value.get("command_type").is_none());
    }

    #[test]
    fn test_command_input_deserializes_both_shapes() {
        let text: CommandInput = serde_json::from_value(json!("wp plugin list")).expect("text");
        assert_eq!(text, CommandInput::Text("wp plugin list".to_string()));

        let structured: CommandInput = serde_json::from_value(json!({
            "command": "wp user list",
            "parameters": {"role": "editor"}
        }))
        .expect("structured");
        match structured {
            CommandInput::Structured {
                command,
                parameters,
            } => {
                assert_eq!(command, "wp user list");
                assert_eq!(parameters["role"], json!("editor"));
            }
            CommandInput::Text(_) => panic!("expected structured input"),
        }
    }

    #[test]
    fn test_param_helpers() {
        let params = json!({"timeout": "15", "days": 7, "status": "  active "})
            .as_object()
            .cloned()
            .unwrap_or_default();
        assert_eq!(param_u64(&params, "timeout"), Some(15));
        assert_eq!(param_u64(&params, "days"), Some(7));
        assert_eq!(param_str(&params, "status").as_deref(), Some("active"));
        assert_eq!(param_str(&params, "missing"), None);
    }
}
