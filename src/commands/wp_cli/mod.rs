//! WP-CLI executor.
//!
//! Provides:
//! - An independent blacklist checked before any other work
//! - Ordered classification of the command (plugin logs, PHP version, plugin
//!   query, system query, general)
//! - A real `wp` invocation when processes can be spawned
//! - A direct-API fallback that emulates the common sub-commands otherwise

mod api;
mod logs;
pub mod table;

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::error::{CommandError, CommandResult};
use crate::logging::{self, Category};
use crate::process::{ProcessRunner, with_timeout};
use crate::site::{ActivityLog, WordPress};

use super::php::php_info_result;
use super::result::{ExecutionMethod, ExecutionResult, Parameters, param_str, param_u64};
use super::rules::RuleTable;
use super::{CommandExecutor, ExecutorSettings, WP_TIMEOUT_CAP_SECS, effective_timeout};

pub use logs::relative_time;

/// Commands answered by the direct plugin-list formatter without classification.
const PLUGIN_LIST_SHORTCUTS: &[&str] = &["wp plugin list", "wp plugins", "plugins"];

/// Caller parameters that become `--key=value` flags when the command lacks them.
const FLAG_PARAMETERS: &[&str] = &[
    "status",
    "update",
    "role",
    "number",
    "post_type",
    "post_status",
    "posts_per_page",
    "post_id",
    "search",
];

// === Parsing ===

/// A WP-CLI command split into group, sub-command, positionals and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The trimmed command as received.
    pub raw: String,
    /// Lower-cased first positional, e.g. `plugin`.
    pub group: String,
    /// Lower-cased second positional, e.g. `list`.
    pub sub: String,
    args: Vec<String>,
    flags: Vec<(String, Option<String>)>,
    /// Tokens after `wp`, in order, with parameter flags appended.
    tokens: Vec<String>,
    /// False when the command had unbalanced quotes and was split on whitespace.
    balanced: bool,
}

impl ParsedCommand {
    #[must_use]
    pub fn parse(command: &str) -> Self {
        let raw = command.trim().to_string();
        let body = strip_wp_prefix(&raw);
        let (tokens, balanced) = match shlex::split(body) {
            Some(tokens) => (tokens, true),
            None => (body.split_whitespace().map(str::to_string).collect(), false),
        };

        let mut parsed = Self {
            raw,
            balanced,
            ..Self::default()
        };
        let mut positional = Vec::new();
        for token in &tokens {
            match token.strip_prefix("--") {
                Some(flag) if !flag.is_empty() => match flag.split_once('=') {
                    Some((key, value)) => parsed
                        .flags
                        .push((key.to_lowercase(), Some(value.to_string()))),
                    None => parsed.flags.push((flag.to_lowercase(), None)),
                },
                _ => positional.push(token.clone()),
            }
        }
        let mut positional = positional.into_iter();
        parsed.group = positional.next().unwrap_or_default().to_lowercase();
        parsed.sub = positional.next().unwrap_or_default().to_lowercase();
        parsed.args = positional.collect();
        parsed.tokens = tokens;
        parsed
    }

    /// Value of `--name=value`; `None` for bare `--name` or absence.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(key, _)| key == name)
    }

    #[must_use]
    pub fn flag_usize(&self, name: &str) -> Option<usize> {
        self.flag(name).and_then(|value| value.parse().ok())
    }

    /// Positional argument after the sub-command.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn is_help(&self) -> bool {
        self.group == "help" || self.sub == "help" || self.has_flag("help")
    }

    fn push_flag(&mut self, key: &str, value: &str) {
        self.flags
            .push((key.to_string(), Some(value.to_string())));
        self.tokens.push(format!("--{key}={value}"));
    }

    fn push_arg(&mut self, value: &str) {
        self.args.push(value.to_string());
        self.tokens.push(value.to_string());
    }

    /// Fill in flags the caller passed as parameters.
    fn apply_parameters(&mut self, parameters: &Parameters) {
        for key in FLAG_PARAMETERS {
            if self.has_flag(key) {
                continue;
            }
            if let Some(value) = param_str(parameters, key) {
                self.push_flag(key, &value);
            }
        }
        if matches!(self.sub.as_str(), "status" | "get")
            && self.args.is_empty()
            && let Some(name) = param_str(parameters, "plugin_name")
            && self.group == "plugin"
        {
            self.push_arg(&name);
        }
    }
}

fn strip_wp_prefix(command: &str) -> &str {
    if command.eq_ignore_ascii_case("wp") {
        return "";
    }
    match command.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("wp ") => command[3..].trim_start(),
        _ => command,
    }
}

// === Classification ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    PluginLogs,
    PhpVersion,
    PluginQuery,
    SystemQuery,
    General,
}

/// Evaluated in order; plugin logs must precede the plugin query.
const CLASSIFICATION: &[(CommandClass, &str)] = &[
    (
        CommandClass::PluginLogs,
        r"(?i)\bplugins?[\s_-]*(logs?|activity|history)\b",
    ),
    (
        CommandClass::PhpVersion,
        r"(?i)\bphp[\s_-]*(-v|--version|version|info)\b|\bphpinfo\b|\bphpversion\b",
    ),
    (CommandClass::PluginQuery, r"(?i)^(wp\s+)?plugins?(\s|$)"),
    (
        CommandClass::SystemQuery,
        r"(?i)^(wp\s+)?(core\s+(version|is-installed)|db\s+(size|check|tables|prefix)|site\s+(info|url))\b",
    ),
];

// === Executor ===

pub struct WpCliExecutor {
    blacklist: RuleTable,
    classifiers: Vec<(CommandClass, Regex)>,
    runner: Arc<dyn ProcessRunner>,
    site: Arc<dyn WordPress>,
    activity: Option<Arc<dyn ActivityLog>>,
    settings: ExecutorSettings,
}

impl WpCliExecutor {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        site: Arc<dyn WordPress>,
        settings: ExecutorSettings,
    ) -> CommandResult<Self> {
        let classifiers = CLASSIFICATION
            .iter()
            .map(|&(class, pattern)| {
                Regex::new(pattern)
                    .map(|re| (class, re))
                    .map_err(|source| CommandError::InvalidPattern {
                        table: "wp_cli_classification",
                        rule: class.as_str(),
                        source,
                    })
            })
            .collect::<CommandResult<Vec<_>>>()?;
        Ok(Self {
            blacklist: RuleTable::executor_blacklist()?,
            classifiers,
            runner,
            site,
            activity: None,
            settings,
        })
    }

    #[must_use]
    pub fn with_activity_log(mut self, log: Arc<dyn ActivityLog>) -> Self {
        self.activity = Some(log);
        self
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: RuleTable) -> Self {
        self.blacklist = blacklist;
        self
    }

    /// First matching class, `General` when none match.
    #[must_use]
    pub fn classify(&self, command: &str) -> CommandClass {
        self.classifiers
            .iter()
            .find(|(_, re)| re.is_match(command))
            .map_or(CommandClass::General, |(class, _)| *class)
    }

    /// Whether commands go through the direct API instead of a `wp` process.
    #[must_use]
    pub fn uses_api_fallback(&self) -> bool {
        self.settings.restricted_mode || !self.runner.is_available()
    }

    /// Run through the direct API regardless of process availability.
    pub fn execute_via_api(&self, command: &str, parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        self.guard(command, || self.run_api(command, parameters))
    }

    /// Run through a `wp` process regardless of restricted mode.
    pub fn execute_via_shell(&self, command: &str, parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        self.guard(command, || self.run_shell(command, parameters))
    }

    fn guard(
        &self,
        command: &str,
        run: impl FnOnce() -> CommandResult<ExecutionResult>,
    ) -> ExecutionResult {
        if let Some(rule) = self.blacklist.vet(command) {
            logging::warn(
                Category::Security,
                format!("WP-CLI command blocked by {}:{rule}", self.blacklist.name()),
            );
            return ExecutionResult::blocked(command);
        }
        run().unwrap_or_else(|err| {
            logging::error(Category::Executor, format!("WP-CLI command failed: {err}"));
            ExecutionResult::error(command, err)
        })
    }

    fn run(&self, command: &str, parameters: &Parameters) -> CommandResult<ExecutionResult> {
        let lower = command.to_lowercase();
        if PLUGIN_LIST_SHORTCUTS.contains(&lower.as_str()) {
            return self.run_api("wp plugin list", parameters).map(|mut result| {
                result.command = command.to_string();
                result
            });
        }

        let class = self.classify(command);
        logging::debug(
            Category::Executor,
            format!("WP-CLI command classified as {}", class.as_str()),
        );
        match class {
            CommandClass::PluginLogs => self.run_plugin_logs(command, parameters),
            CommandClass::PhpVersion => Ok(php_info_result(command, &self.site.php_runtime())),
            CommandClass::SystemQuery => self.run_api(command, parameters),
            CommandClass::PluginQuery => {
                let normalized = normalize_plugin_alias(command);
                self.dispatch(&normalized, parameters)
            }
            CommandClass::General => self.dispatch(command, parameters),
        }
    }

    fn dispatch(&self, command: &str, parameters: &Parameters) -> CommandResult<ExecutionResult> {
        if self.uses_api_fallback() {
            logging::info(
                Category::Executor,
                "Process execution unavailable, using the direct WordPress API",
            );
            self.run_api(command, parameters)
        } else {
            self.run_shell(command, parameters)
        }
    }

    fn run_api(&self, command: &str, parameters: &Parameters) -> CommandResult<ExecutionResult> {
        let mut parsed = ParsedCommand::parse(command);
        parsed.apply_parameters(parameters);
        api::execute(self.site.as_ref(), &parsed)
    }

    fn run_plugin_logs(
        &self,
        command: &str,
        parameters: &Parameters,
    ) -> CommandResult<ExecutionResult> {
        let Some(log) = &self.activity else {
            let message = "Plugin activity logging is not available";
            return Ok(ExecutionResult::failure(command, message)
                .with_error(message)
                .with_command_type("plugin_logs"));
        };
        let parsed = ParsedCommand::parse(command);
        let request = logs::LogRequest::resolve(&parsed, parameters, &self.settings);
        logs::report(log.as_ref(), command, &request)
    }

    fn run_shell(&self, command: &str, parameters: &Parameters) -> CommandResult<ExecutionResult> {
        let mut parsed = ParsedCommand::parse(command);
        if !parsed.balanced {
            return Err(CommandError::invalid_command("unbalanced quotes in WP-CLI command"));
        }
        parsed.apply_parameters(parameters);

        let requested_format = param_str(parameters, "format").map(|f| f.to_lowercase());
        let is_list = parsed.sub == "list";
        let append_json = !parsed.has_flag("format")
            && !parsed.is_help()
            && (requested_format.as_deref() == Some("json") || is_list);

        let mut args = parsed.tokens.clone();
        if append_json {
            args.push("--format=json".to_string());
        }

        let secs = effective_timeout(
            param_u64(parameters, "timeout"),
            self.settings.wp_timeout_secs,
            WP_TIMEOUT_CAP_SECS,
        );
        let argv = with_timeout(secs, &self.settings.wp_binary, args);
        logging::debug(Category::Executor, format!("Running {}", argv.join(" ")));

        let output = self.runner.run(&argv, Duration::from_secs(secs))?;
        let lines = output.lines();

        if !output.success() {
            let mut result = ExecutionResult::failure(command, lines.join("\n"))
                .with_return_code(output.exit_code)
                .with_method(ExecutionMethod::Shell);
            if output.timed_out {
                result = result.with_error(format!("Command timed out after {secs}s"));
            }
            return Ok(result);
        }

        let json_output = append_json || parsed.flag("format") == Some("json");
        if is_list
            && json_output
            && let Ok(Value::Array(rows)) = serde_json::from_str::<Value>(output.stdout.trim())
        {
            return Ok(api::list_result(command, &parsed.group, rows)
                .with_return_code(output.exit_code)
                .with_method(ExecutionMethod::Shell));
        }

        let result = match requested_format.as_deref() {
            Some("json") => {
                let data = serde_json::from_str::<Value>(output.stdout.trim())
                    .unwrap_or_else(|_| lines_value(&lines));
                ExecutionResult::success(command, output.stdout.trim()).with_data(data)
            }
            Some("array") => {
                ExecutionResult::success(command, lines.join("\n")).with_data(lines_value(&lines))
            }
            _ => ExecutionResult::success(command, lines.join("\n")),
        };
        Ok(result
            .with_return_code(output.exit_code)
            .with_method(ExecutionMethod::Shell))
    }
}

impl CommandExecutor for WpCliExecutor {
    fn execute(&self, command: &str, parameters: &Parameters) -> ExecutionResult {
        let command = command.trim();
        self.guard(command, || self.run(command, parameters))
    }
}

impl CommandClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PluginLogs => "plugin_logs",
            Self::PhpVersion => "php_version",
            Self::PluginQuery => "plugin",
            Self::SystemQuery => "system",
            Self::General => "general",
        }
    }
}

/// `wp plugins list` → `wp plugin list`.
fn normalize_plugin_alias(command: &str) -> String {
    let body = strip_wp_prefix(command);
    match body.split_once(char::is_whitespace) {
        Some((first, rest)) if first.eq_ignore_ascii_case("plugins") => {
            format!("wp plugin {}", rest.trim_start())
        }
        None if body.eq_ignore_ascii_case("plugins") => "wp plugin list".to_string(),
        _ => command.to_string(),
    }
}

fn lines_value(lines: &[String]) -> Value {
    Value::Array(lines.iter().cloned().map(Value::String).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::FakeRunner;
    use crate::site::InMemorySite;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PLUGIN_JSON: &str = r#"[
        {"name":"akismet","status":"active","update":"available","version":"5.3.3"},
        {"name":"hello","status":"inactive","update":"none","version":"1.7.2"}
    ]"#;

    fn executor(runner: FakeRunner) -> (WpCliExecutor, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        let site = Arc::new(InMemorySite::sample());
        let executor = WpCliExecutor::new(runner.clone(), site.clone(), ExecutorSettings::default())
            .expect("executor")
            .with_activity_log(site);
        (executor, runner)
    }

    fn params(value: serde_json::Value) -> Parameters {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_parse_splits_flags_and_positionals() {
        let parsed = ParsedCommand::parse("wp option update blogname 'My Site' --autoload=no --quiet");
        assert_eq!(parsed.group, "option");
        assert_eq!(parsed.sub, "update");
        assert_eq!(parsed.arg(0), Some("blogname"));
        assert_eq!(parsed.arg(1), Some("My Site"));
        assert_eq!(parsed.flag("autoload"), Some("no"));
        assert!(parsed.has_flag("quiet"));
        assert_eq!(parsed.flag("quiet"), None);
    }

    #[test]
    fn test_classification_order() {
        let (executor, _) = executor(FakeRunner::replying("", 0));
        assert_eq!(executor.classify("wp plugin logs --days=7"), CommandClass::PluginLogs);
        assert_eq!(executor.classify("wp plugin list"), CommandClass::PluginQuery);
        assert_eq!(executor.classify("wp php version"), CommandClass::PhpVersion);
        assert_eq!(executor.classify("wp core version"), CommandClass::SystemQuery);
        assert_eq!(executor.classify("wp post list"), CommandClass::General);
    }

    #[test]
    fn test_blacklist_blocks_before_any_work() {
        let (executor, runner) = executor(FakeRunner::replying("", 0));
        for command in ["sudo wp plugin list", "wp eval 'phpinfo();'", "wp shell", "shutdown now"] {
            let result = executor.execute(command, &Parameters::new());
            assert!(!result.success, "{command}");
            assert_eq!(result.output, crate::commands::BLOCKED_OUTPUT);
        }
        assert!(runner.last_call().is_none());
    }

    #[test]
    fn test_blacklist_sees_through_quoting() {
        let (executor, runner) = executor(FakeRunner::replying("", 0));
        for command in ["wp user delete '1' --yes", "wp db 'reset' --yes", r#"wp "db" reset --yes"#] {
            let result = executor.execute(command, &Parameters::new());
            assert!(!result.success, "{command}");
            assert_eq!(result.output, crate::commands::BLOCKED_OUTPUT);
        }
        assert!(runner.last_call().is_none());
    }

    #[test]
    fn test_custom_blacklist_replaces_builtin() {
        let (executor, runner) = executor(FakeRunner::replying("[]", 0));
        let custom = RuleTable::compile("site_policy", &[("cache_flush", r"(?i)\bwp\s+cache\s+flush\b")])
            .expect("compile");
        let executor = executor.with_blacklist(custom);

        let blocked = executor.execute("wp 'cache' flush", &Parameters::new());
        assert!(!blocked.success);
        assert_eq!(blocked.output, crate::commands::BLOCKED_OUTPUT);
        assert!(runner.last_call().is_none());

        executor.execute("wp comment list", &Parameters::new());
        assert!(runner.last_call().is_some());
    }

    #[test]
    fn test_shortcut_uses_direct_formatter_with_status() {
        let (executor, runner) = executor(FakeRunner::replying("", 0));
        let result = executor.execute("wp plugin list", &params(json!({"status": "active"})));
        assert!(result.success);
        assert_eq!(result.command_type.as_deref(), Some("plugin_list"));
        assert_eq!(result.method, Some(ExecutionMethod::WpApi));
        let table = result.result.expect("table");
        assert_eq!(table.lines().count(), 3);
        assert!(!table.contains("inactive"));
        assert!(runner.last_call().is_none());

        assert!(executor.execute("plugins", &Parameters::new()).success);
    }

    #[test]
    fn test_shell_path_appends_json_for_lists_only() {
        let (executor, runner) = executor(FakeRunner::replying(PLUGIN_JSON, 0));
        let result = executor.execute("wp plugin list --status=active", &Parameters::new());
        assert_eq!(
            runner.last_call(),
            Some(
                ["timeout", "30s", "wp", "plugin", "list", "--status=active", "--format=json"]
                    .map(String::from)
                    .to_vec()
            )
        );
        assert_eq!(result.method, Some(ExecutionMethod::Shell));
        assert_eq!(result.command_type.as_deref(), Some("plugin_list"));
        assert_eq!(
            result.result.as_deref(),
            Some("NAME\tSTATUS\tUPDATE\tVERSION\nakismet\tactive\tavailable\t5.3.3\nhello\tinactive\tnone\t1.7.2")
        );

        executor.execute("wp cache flush", &Parameters::new());
        assert_eq!(
            runner.last_call().map(|argv| argv.contains(&"--format=json".to_string())),
            Some(false)
        );

        executor.execute("wp help plugin", &params(json!({"format": "json"})));
        assert_eq!(
            runner.last_call().map(|argv| argv.contains(&"--format=json".to_string())),
            Some(false)
        );

        executor.execute("wp post list --format=csv", &Parameters::new());
        assert_eq!(
            runner.last_call().map(|argv| argv.last().cloned()),
            Some(Some("--format=csv".to_string()))
        );
    }

    #[test]
    fn test_shell_formats_and_timeout() {
        let (executor, runner) = executor(FakeRunner::replying("line one\nline two\n", 0));
        let array = executor.execute("wp cache type", &params(json!({"format": "array", "timeout": 600})));
        assert_eq!(array.data, Some(json!(["line one", "line two"])));
        assert_eq!(runner.last_call().map(|argv| argv[1].clone()), Some("60s".to_string()));

        let text = executor.execute("wp cache type", &Parameters::new());
        assert_eq!(text.output, "line one\nline two");
        assert_eq!(text.data, None);

        let json_fallback = executor.execute("wp cache type", &params(json!({"format": "json"})));
        assert_eq!(json_fallback.data, Some(json!(["line one", "line two"])));
    }

    #[test]
    fn test_shell_failure_keeps_return_code() {
        let (executor, _) = executor(FakeRunner::replying("Error: 'foo' is not a registered wp command.", 1));
        let result = executor.execute("wp foo", &Parameters::new());
        assert!(!result.success);
        assert_eq!(result.return_code, Some(1));
        assert!(result.output.starts_with("Error: 'foo'"));
    }

    #[test]
    fn test_api_fallback_when_processes_unavailable() {
        let (executor, runner) = executor(FakeRunner::unavailable());
        assert!(executor.uses_api_fallback());
        let result = executor.execute("wp user list --role=editor", &Parameters::new());
        assert!(result.success);
        assert_eq!(result.method, Some(ExecutionMethod::WpApi));
        assert_eq!(result.command_type.as_deref(), Some("user_list"));
        assert!(runner.last_call().is_none());

        let plugin = executor.execute("wp plugin status", &params(json!({"plugin_name": "akismet"})));
        assert!(plugin.output.contains("title\tAkismet"));
    }

    #[test]
    fn test_restricted_mode_forces_api() {
        let runner = Arc::new(FakeRunner::replying(PLUGIN_JSON, 0));
        let settings = ExecutorSettings {
            restricted_mode: true,
            ..ExecutorSettings::default()
        };
        let executor =
            WpCliExecutor::new(runner.clone(), Arc::new(InMemorySite::sample()), settings).expect("executor");
        let result = executor.execute("wp theme list", &Parameters::new());
        assert_eq!(result.method, Some(ExecutionMethod::WpApi));
        assert!(runner.last_call().is_none());
    }

    #[test]
    fn test_php_version_and_system_queries_skip_the_shell() {
        let (executor, runner) = executor(FakeRunner::replying("", 0));
        let php = executor.execute("wp php version", &Parameters::new());
        assert!(php.output.contains("PHP Version:"));
        let core = executor.execute("wp core version", &Parameters::new());
        assert_eq!(core.output, "6.6.2");
        assert!(runner.last_call().is_none());
    }

    #[test]
    fn test_plugin_logs_slice() {
        let (executor, _) = executor(FakeRunner::replying("", 0));
        let result = executor.execute("wp plugin logs", &params(json!({"days": 7})));
        assert!(result.success);
        assert_eq!(result.command_type.as_deref(), Some("plugin_logs"));
        assert_eq!(result.data.expect("data")["total"], json!(2));

        let without_log =
            WpCliExecutor::new(Arc::new(FakeRunner::unavailable()), Arc::new(InMemorySite::sample()), ExecutorSettings::default())
                .expect("executor");
        assert!(!without_log.execute("wp plugin logs", &Parameters::new()).success);
    }

    #[test]
    fn test_garbage_input_is_well_formed() {
        let (executor, _) = executor(FakeRunner::replying("", 0));
        for input in ["", "   ", "wp", "'unterminated", "\u{0}\u{7f}", "wp plugin get", "🙂 🙃"] {
            let result = executor.execute(input, &Parameters::new());
            assert_eq!(result.command, input.trim());
            assert!(serde_json::to_value(&result).is_ok());
        }
    }

    #[test]
    fn test_plugin_alias_normalization() {
        assert_eq!(normalize_plugin_alias("wp plugins list"), "wp plugin list");
        assert_eq!(normalize_plugin_alias("plugins"), "wp plugin list");
        assert_eq!(normalize_plugin_alias("wp plugin status"), "wp plugin status");
    }
}
