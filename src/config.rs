//! Configuration loading and defaults for wpai.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::commands::{ExecutorSettings, PHP_TIMEOUT_CAP_SECS, WP_TIMEOUT_CAP_SECS};
use crate::logging::{self, Category};
use crate::process::SystemRunner;

// === Types ===

/// `[execution]` section: how commands reach `wp` and `php`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionConfig {
    pub shell_enabled: Option<bool>,
    pub restricted_mode: Option<bool>,
    pub wp_binary: Option<String>,
    pub php_binary: Option<String>,
    pub working_dir: Option<String>,
    pub wp_timeout_secs: Option<u64>,
    pub php_timeout_secs: Option<u64>,
}

/// `[logs]` section: defaults for plugin activity reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsConfig {
    pub default_days: Option<u32>,
    pub default_limit: Option<usize>,
}

/// `[site]` section: where the in-memory site fixture lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    pub fixture: Option<String>,
}

/// Resolved configuration, including defaults and environment overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub execution: Option<ExecutionConfig>,
    pub logs: Option<LogsConfig>,
    pub site: Option<SiteConfig>,
}

impl Config {
    /// Load configuration from disk and merge with environment overrides.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path.or_else(default_config_path);
        let mut config = match path.as_ref() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        logging::debug(
            Category::Config,
            format!("Loaded config from {}", path.display()),
        );
        Ok(config)
    }

    /// Reject empty binaries and zero timeouts.
    pub fn validate(&self) -> Result<()> {
        let Some(execution) = &self.execution else {
            return Ok(());
        };
        for (key, value) in [
            ("wp_binary", &execution.wp_binary),
            ("php_binary", &execution.php_binary),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                anyhow::bail!("execution.{key} cannot be empty string");
            }
        }
        for (key, value) in [
            ("wp_timeout_secs", execution.wp_timeout_secs),
            ("php_timeout_secs", execution.php_timeout_secs),
        ] {
            if value == Some(0) {
                anyhow::bail!("execution.{key} must be at least 1");
            }
        }
        Ok(())
    }

    fn execution(&self) -> ExecutionConfig {
        self.execution.clone().unwrap_or_default()
    }

    /// Whether `wp`/`php` processes may be spawned at all.
    #[must_use]
    pub fn shell_enabled(&self) -> bool {
        self.execution().shell_enabled.unwrap_or(true)
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.execution()
            .working_dir
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| expand_path(&dir))
    }

    /// Fixture file for the in-memory site, if configured.
    #[must_use]
    pub fn site_fixture(&self) -> Option<PathBuf> {
        self.site
            .as_ref()
            .and_then(|site| site.fixture.as_deref())
            .filter(|path| !path.trim().is_empty())
            .map(expand_path)
    }

    /// Executor settings with defaults applied and timeouts capped.
    #[must_use]
    pub fn executor_settings(&self) -> ExecutorSettings {
        let defaults = ExecutorSettings::default();
        let execution = self.execution();
        let logs = self.logs.clone().unwrap_or_default();
        ExecutorSettings {
            wp_binary: execution.wp_binary.unwrap_or(defaults.wp_binary),
            php_binary: execution.php_binary.unwrap_or(defaults.php_binary),
            wp_timeout_secs: execution
                .wp_timeout_secs
                .unwrap_or(defaults.wp_timeout_secs)
                .clamp(1, WP_TIMEOUT_CAP_SECS),
            php_timeout_secs: execution
                .php_timeout_secs
                .unwrap_or(defaults.php_timeout_secs)
                .clamp(1, PHP_TIMEOUT_CAP_SECS),
            restricted_mode: execution.restricted_mode.unwrap_or(defaults.restricted_mode),
            log_days: logs.default_days.unwrap_or(defaults.log_days).max(1),
            log_limit: logs.default_limit.unwrap_or(defaults.log_limit).max(1),
        }
    }

    /// Process runner honoring `shell_enabled` and `working_dir`.
    #[must_use]
    pub fn runner(&self) -> SystemRunner {
        SystemRunner::new(self.working_dir()).with_enabled(self.shell_enabled())
    }
}

// === Defaults ===

fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("WPAI_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return Some(expand_path(&path));
    }
    dirs::config_dir().map(|dir| dir.join("wpai").join("config.toml"))
}

fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

// === Environment Overrides ===

fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let execution = config.execution.get_or_insert_with(ExecutionConfig::default);
    if let Some(value) = lookup("WPAI_WP_BINARY") {
        execution.wp_binary = Some(value);
    }
    if let Some(value) = lookup("WPAI_PHP_BINARY") {
        execution.php_binary = Some(value);
    }
    if let Some(value) = lookup("WPAI_WORKING_DIR") {
        execution.working_dir = Some(value);
    }
    if let Some(value) = lookup("WPAI_SHELL_ENABLED").and_then(|v| parse_bool(&v)) {
        execution.shell_enabled = Some(value);
    }
    if let Some(value) = lookup("WPAI_RESTRICTED_MODE").and_then(|v| parse_bool(&v)) {
        execution.restricted_mode = Some(value);
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::default();
        assert!(config.shell_enabled());
        assert_eq!(config.executor_settings(), ExecutorSettings::default());
        assert!(config.working_dir().is_none());
        assert!(config.site_fixture().is_none());
    }

    #[test]
    fn test_load_from_file_caps_timeouts() {
        let (_dir, path) = write_config(
            r#"
[execution]
wp_binary = "/usr/local/bin/wp"
wp_timeout_secs = 600
php_timeout_secs = 5
restricted_mode = true

[logs]
default_days = 7
"#,
        );
        let config = Config::from_file(&path).expect("load");
        config.validate().expect("valid");
        let settings = config.executor_settings();
        assert_eq!(settings.wp_binary, "/usr/local/bin/wp");
        assert_eq!(settings.php_binary, "php");
        assert_eq!(settings.wp_timeout_secs, WP_TIMEOUT_CAP_SECS);
        assert_eq!(settings.php_timeout_secs, 5);
        assert!(settings.restricted_mode);
        assert_eq!(settings.log_days, 7);
        assert_eq!(settings.log_limit, 20);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(Some(dir.path().join("absent.toml"))).expect("load");
        assert!(config.execution.is_some());
    }

    #[test]
    fn test_parse_error_names_file() {
        let (_dir, path) = write_config("[execution\nwp_binary = 1");
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_empty_binary_and_zero_timeout() {
        let mut config = Config {
            execution: Some(ExecutionConfig {
                wp_binary: Some("  ".to_string()),
                ..ExecutionConfig::default()
            }),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.execution = Some(ExecutionConfig {
            php_timeout_secs: Some(0),
            ..ExecutionConfig::default()
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("php_timeout_secs"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WPAI_WP_BINARY", "/opt/wp"),
            ("WPAI_SHELL_ENABLED", "off"),
            ("WPAI_RESTRICTED_MODE", "yes"),
            ("WPAI_WORKING_DIR", "/var/www/html"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| (*v).to_string()));

        assert!(!config.shell_enabled());
        assert_eq!(config.working_dir(), Some(PathBuf::from("/var/www/html")));
        let settings = config.executor_settings();
        assert_eq!(settings.wp_binary, "/opt/wp");
        assert!(settings.restricted_mode);
    }

    #[test]
    fn test_unparseable_bool_is_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| {
            (key == "WPAI_SHELL_ENABLED").then(|| "maybe".to_string())
        });
        assert!(config.shell_enabled());
    }
}
