//! Minimal stand-ins used when a pipeline component fails to construct.
//!
//! None of these compile a regex, so none of them can fail. Each is strictly
//! weaker than the component it replaces.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::site::WordPress;

use super::detector::{CommandKind, Detect, DetectedCommand};
use super::php::format_php_info;
use super::result::{ExecutionMethod, ExecutionResult, Parameters};
use super::sanitizer::Sanitize;
use super::security::{SecurityCheck, SecurityVerdict};
use super::wp_cli::table::{Table, columns_for};
use super::CommandExecutor;

/// Characters the minimal sanitizer removes.
const MINIMAL_STRIPPED: &[char] = &[';', '&', '|', '>', '<'];

/// Substrings the minimal security filter refuses (case-insensitive).
const MINIMAL_DANGEROUS: &[&str] = &["rm -rf", "drop table", "wp user delete 1"];

/// Flags whose values are hidden from logs.
const SECRET_FLAGS: &[&str] = &["--pass=", "--password=", "--user_pass=", "--key=", "--api-key="];

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalSanitizer;

impl Sanitize for MinimalSanitizer {
    fn sanitize(&self, command: &str) -> String {
        command
            .chars()
            .filter(|c| !MINIMAL_STRIPPED.contains(c))
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn clean_parameters(&self, parameters: &Parameters) -> Parameters {
        parameters
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => Value::String(self.sanitize(s)),
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalSecurity;

impl SecurityCheck for MinimalSecurity {
    fn check(&self, command: &str) -> SecurityVerdict {
        let lower = command.to_lowercase();
        MINIMAL_DANGEROUS
            .iter()
            .find(|needle| lower.contains(*needle))
            .map_or(SecurityVerdict::Safe, |needle| SecurityVerdict::Dangerous {
                rule: format!("minimal:{needle}"),
            })
    }

    fn get_safe_command_for_logging(&self, command: &str) -> String {
        command
            .split(' ')
            .map(|token| {
                SECRET_FLAGS
                    .iter()
                    .find(|flag| token.to_lowercase().starts_with(*flag))
                    .map_or_else(|| token.to_string(), |flag| format!("{flag}********"))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Answers `wp plugin list` from the site API and refuses everything else.
pub struct MinimalWpCliExecutor {
    site: Arc<dyn WordPress>,
}

impl MinimalWpCliExecutor {
    #[must_use]
    pub fn new(site: Arc<dyn WordPress>) -> Self {
        Self { site }
    }
}

impl CommandExecutor for MinimalWpCliExecutor {
    fn execute(&self, command: &str, _parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        if command != "wp plugin list" {
            let message = "WP-CLI executor is unavailable";
            return ExecutionResult::failure(command, message).with_error(message);
        }

        match self.site.plugins() {
            Ok(plugins) => {
                let rows: Vec<Value> = plugins
                    .iter()
                    .map(|p| {
                        json!({
                            "name": p.slug(),
                            "status": p.status(),
                            "update": if p.update_available() { "available" } else { "none" },
                            "version": p.version,
                        })
                    })
                    .collect();
                let tsv = Table::from_rows(&rows, columns_for("plugin")).to_tsv();
                ExecutionResult::success(command, tsv.clone())
                    .with_result(tsv)
                    .with_command_type("plugin_list")
                    .with_method(ExecutionMethod::WpApi)
            }
            Err(err) => ExecutionResult::error(command, err),
        }
    }
}

/// Answers PHP version queries only.
pub struct MinimalPhpExecutor {
    site: Arc<dyn WordPress>,
}

impl MinimalPhpExecutor {
    #[must_use]
    pub fn new(site: Arc<dyn WordPress>) -> Self {
        Self { site }
    }
}

impl CommandExecutor for MinimalPhpExecutor {
    fn execute(&self, command: &str, _parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        if matches!(command, "php -v" | "php --version" | "php version") {
            return ExecutionResult::success(command, format_php_info(&self.site.php_runtime()))
                .with_command_type("php_version")
                .with_method(ExecutionMethod::WpApi);
        }
        let message = "PHP executor is unavailable";
        ExecutionResult::failure(command, message).with_error(message)
    }
}

/// Recognizes explicit `wp `/`php ` commands and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitOnlyDetector;

impl Detect for ExplicitOnlyDetector {
    fn detect_command(&self, message: &str) -> Option<DetectedCommand> {
        let message = message.trim();
        (message.starts_with("wp ") || message.starts_with("php ")).then(|| DetectedCommand {
            kind: CommandKind::Explicit,
            command: message.to_string(),
            parameters: Parameters::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::InMemorySite;

    #[test]
    fn test_minimal_sanitizer_strips_only_basic_operators() {
        assert_eq!(MinimalSanitizer.sanitize(" wp plugin list; ls | x "), "wp plugin list ls  x");
        assert_eq!(MinimalSanitizer.sanitize("echo $HOME"), "echo $HOME");
    }

    #[test]
    fn test_minimal_security_literals() {
        assert!(MinimalSecurity.is_dangerous("sudo RM -RF /"));
        assert!(MinimalSecurity.is_dangerous("wp db query 'DROP TABLE x'"));
        assert!(!MinimalSecurity.is_dangerous("wp plugin list"));
        assert_eq!(
            MinimalSecurity.get_safe_command_for_logging("wp user create a --password=secret"),
            "wp user create a --password=********"
        );
        assert_eq!(
            MinimalSecurity.get_safe_command_for_logging("wp user update 2 --user_pass=hunter2"),
            "wp user update 2 --user_pass=********"
        );
    }

    #[test]
    fn test_minimal_wp_cli_only_lists_plugins() {
        let executor = MinimalWpCliExecutor::new(Arc::new(InMemorySite::sample()));
        let result = executor.execute("wp plugin list", &Parameters::new());
        assert!(result.success);
        assert_eq!(result.command_type.as_deref(), Some("plugin_list"));
        assert!(result.output.starts_with("NAME\tSTATUS\tUPDATE\tVERSION"));

        assert!(!executor.execute("wp user list", &Parameters::new()).success);
    }

    #[test]
    fn test_minimal_php_and_detector() {
        let php = MinimalPhpExecutor::new(Arc::new(InMemorySite::sample()));
        assert!(php.execute("php -v", &Parameters::new()).output.contains("PHP Version:"));
        assert!(!php.execute("php -m", &Parameters::new()).success);

        assert!(ExplicitOnlyDetector.detect_command("wp core version").is_some());
        assert!(ExplicitOnlyDetector.detect_command("list active plugins").is_none());
    }
}
