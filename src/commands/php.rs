//! PHP executor.
//!
//! Version and info queries are answered from the runtime facts the site
//! reports, without spawning. Everything else runs as
//! `timeout <N>s php <args…>`.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::json;

use crate::error::{CommandError, CommandResult};
use crate::logging::{self, Category};
use crate::process::{ProcessRunner, with_timeout};
use crate::site::{PhpRuntime, WordPress};

use super::result::{ExecutionMethod, ExecutionResult, Parameters, param_u64};
use super::{CommandExecutor, ExecutorSettings, PHP_TIMEOUT_CAP_SECS, effective_timeout};

const VERSION_QUERY_PATTERN: &str =
    r"(?i)^\s*php\s+(-v|--version|version|-i|--info|info)(\s|$)|\bphpinfo\b";

/// Number of loaded extensions listed in the synthesized report.
const LISTED_EXTENSIONS: usize = 15;

pub struct PhpExecutor {
    runner: Arc<dyn ProcessRunner>,
    site: Arc<dyn WordPress>,
    php_binary: String,
    default_timeout: u64,
    version_query: Regex,
}

impl PhpExecutor {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        site: Arc<dyn WordPress>,
        settings: &ExecutorSettings,
    ) -> CommandResult<Self> {
        let version_query =
            Regex::new(VERSION_QUERY_PATTERN).map_err(|source| CommandError::InvalidPattern {
                table: "php_executor",
                rule: "version_query",
                source,
            })?;
        Ok(Self {
            runner,
            site,
            php_binary: settings.php_binary.clone(),
            default_timeout: settings.php_timeout_secs,
            version_query,
        })
    }

    fn run(&self, command: &str, parameters: &Parameters) -> CommandResult<ExecutionResult> {
        if self.version_query.is_match(command) {
            return Ok(php_info_result(command, &self.site.php_runtime()));
        }

        if !self.runner.is_available() {
            let message = "PHP execution is disabled: process execution is not available on this host";
            return Ok(ExecutionResult::failure(command, message).with_error(message));
        }

        let rest = command
            .strip_prefix("php ")
            .or_else(|| (command == "php").then_some(""))
            .unwrap_or(command);
        let args = shlex::split(rest)
            .ok_or_else(|| CommandError::invalid_command("unbalanced quotes in PHP command"))?;

        let secs = effective_timeout(
            param_u64(parameters, "timeout"),
            self.default_timeout,
            PHP_TIMEOUT_CAP_SECS,
        );
        let argv = with_timeout(secs, &self.php_binary, args);
        logging::debug(Category::Executor, format!("Running {}", argv.join(" ")));

        let output = self.runner.run(&argv, Duration::from_secs(secs))?;
        let text = output.lines().join("\n");

        if output.success() {
            return Ok(ExecutionResult::success(command, text)
                .with_return_code(output.exit_code)
                .with_method(ExecutionMethod::Shell));
        }

        let mut result = ExecutionResult::failure(command, text)
            .with_return_code(output.exit_code)
            .with_method(ExecutionMethod::Shell);
        if output.timed_out {
            result = result.with_error(format!("Command timed out after {secs}s"));
        }
        Ok(result)
    }
}

impl CommandExecutor for PhpExecutor {
    fn execute(&self, command: &str, parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        self.run(command, parameters).unwrap_or_else(|err| {
            logging::error(
                Category::Executor,
                format!("PHP command failed: {err}"),
            );
            ExecutionResult::error(command, err)
        })
    }
}

/// Human-readable PHP runtime report, also used by the WP-CLI executor.
#[must_use]
pub fn format_php_info(runtime: &PhpRuntime) -> String {
    let mut lines = vec![
        format!("PHP Version: {}", runtime.version),
        format!("Operating System: {}", runtime.os),
        format!("Server API: {}", runtime.sapi),
        format!("Memory Limit: {}", runtime.memory_limit),
        format!("Max Execution Time: {}", runtime.max_execution_time),
        format!("Upload Max Filesize: {}", runtime.upload_max_filesize),
        format!("Post Max Size: {}", runtime.post_max_size),
        format!("Max Input Vars: {}", runtime.max_input_vars),
    ];
    if !runtime.extensions.is_empty() {
        let shown: Vec<&str> = runtime
            .extensions
            .iter()
            .take(LISTED_EXTENSIONS)
            .map(String::as_str)
            .collect();
        lines.push(String::new());
        lines.push(format!(
            "Loaded Extensions ({} of {}): {}",
            shown.len(),
            runtime.extensions.len(),
            shown.join(", ")
        ));
    }
    lines.join("\n")
}

pub(crate) fn php_info_result(command: &str, runtime: &PhpRuntime) -> ExecutionResult {
    ExecutionResult::success(command, format_php_info(runtime))
        .with_method(ExecutionMethod::WpApi)
        .with_command_type("php_version")
        .with_data(json!(runtime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FakeRunner;
    use crate::site::InMemorySite;
    use serde_json::json;

    fn executor(runner: FakeRunner) -> (PhpExecutor, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        let executor = PhpExecutor::new(
            runner.clone(),
            Arc::new(InMemorySite::sample()),
            &ExecutorSettings::default(),
        )
        .expect("executor");
        (executor, runner)
    }

    fn params(value: serde_json::Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_version_query_is_synthesized() {
        let (executor, runner) = executor(FakeRunner::replying("", 0));
        for command in ["php -v", "php --version", "php version", "php -i", "phpinfo"] {
            let result = executor.execute(command, &Parameters::new());
            assert!(result.success, "{command}");
            assert!(result.output.contains("PHP Version: 8.2.12"), "{command}");
            assert_eq!(result.command_type.as_deref(), Some("php_version"));
        }
        assert!(runner.last_call().is_none());
    }

    #[test]
    fn test_info_lists_first_fifteen_extensions() {
        let info = format_php_info(&InMemorySite::sample().php_runtime());
        assert!(info.contains("Server API: fpm-fcgi"));
        assert!(info.contains("Max Input Vars: 1000"));
        assert!(info.contains("(15 of 19)"));
        assert!(info.contains("json"));
        assert!(!info.contains("mysqli"));
    }

    #[test]
    fn test_runs_with_timeout_and_cap() {
        let (executor, runner) = executor(FakeRunner::replying("1\n", 0));
        let result = executor.execute("php -r 'echo 1'", &params(json!({"timeout": 120})));
        assert!(result.success);
        assert_eq!(result.output, "1");
        assert_eq!(
            runner.last_call(),
            Some(vec![
                "timeout".to_string(),
                "30s".to_string(),
                "php".to_string(),
                "-r".to_string(),
                "echo 1".to_string(),
            ])
        );

        executor.execute("php -m", &Parameters::new());
        assert_eq!(runner.last_call().map(|argv| argv[1].clone()), Some("10s".to_string()));
    }

    #[test]
    fn test_non_zero_exit_is_failure_with_code() {
        let (executor, _) = executor(FakeRunner::replying("Parse error", 255));
        let result = executor.execute("php broken.php", &Parameters::new());
        assert!(!result.success);
        assert_eq!(result.return_code, Some(255));
        assert_eq!(result.output, "Parse error");
    }

    #[test]
    fn test_unavailable_runner_reports_disabled() {
        let (executor, _) = executor(FakeRunner::unavailable());
        let result = executor.execute("php -m", &Parameters::new());
        assert!(!result.success);
        assert!(result.output.contains("disabled"));
    }

    #[test]
    fn test_malformed_input_is_an_error_result() {
        let (executor, _) = executor(FakeRunner::replying("", 0));
        let result = executor.execute("php -r 'unterminated", &Parameters::new());
        assert!(!result.success);
        assert!(result.output.starts_with("Error executing command: "));
        assert!(result.error.is_some());
    }
}
