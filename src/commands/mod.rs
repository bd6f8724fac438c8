//! The command pipeline: detect, sanitize, vet, execute.
//!
//! [`CommandHandler`] is the single entry point. Each stage is a trait so the
//! handler can swap in a minimal stand-in from [`fallback`] when a component
//! fails to construct.

pub mod detector;
pub mod fallback;
pub mod handler;
pub mod php;
pub mod result;
pub mod rules;
pub mod sanitizer;
pub mod security;
pub mod wp_cli;

pub use detector::{CommandDetector, CommandKind, Detect, DetectedCommand};
pub use handler::{CommandHandler, HandlerBuilder};
pub use php::PhpExecutor;
pub use result::{BLOCKED_OUTPUT, CommandInput, ExecutionMethod, ExecutionResult, Parameters};
pub use rules::RuleTable;
pub use sanitizer::{CommandSanitizer, Sanitize};
pub use security::{CommandSecurity, SecurityCheck, SecurityVerdict};
pub use wp_cli::WpCliExecutor;

/// Hard ceiling for PHP process timeouts, in seconds.
pub const PHP_TIMEOUT_CAP_SECS: u64 = 30;

/// Hard ceiling for WP-CLI process timeouts, in seconds.
pub const WP_TIMEOUT_CAP_SECS: u64 = 60;

/// Executor contract shared by the PHP and WP-CLI executors.
///
/// Implementations never panic on bad input and never return an `Err`: every
/// failure is folded into the returned [`ExecutionResult`].
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str, parameters: &Parameters) -> ExecutionResult;
}

/// Knobs shared by both executors. Built from the `[execution]` and `[logs]`
/// config sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub wp_binary: String,
    pub php_binary: String,
    pub wp_timeout_secs: u64,
    pub php_timeout_secs: u64,
    /// Forces the direct-API path even when processes can be spawned.
    pub restricted_mode: bool,
    pub log_days: u32,
    pub log_limit: usize,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            wp_binary: "wp".to_string(),
            php_binary: "php".to_string(),
            wp_timeout_secs: 30,
            php_timeout_secs: 10,
            restricted_mode: false,
            log_days: 30,
            log_limit: 20,
        }
    }
}

/// Effective timeout: the caller's request (or `default`), at least one
/// second, never above `cap`.
#[must_use]
pub fn effective_timeout(requested: Option<u64>, default: u64, cap: u64) -> u64 {
    requested
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
        .clamp(1, cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_timeout() {
        assert_eq!(effective_timeout(None, 10, PHP_TIMEOUT_CAP_SECS), 10);
        assert_eq!(effective_timeout(Some(90), 10, PHP_TIMEOUT_CAP_SECS), 30);
        assert_eq!(effective_timeout(Some(0), 30, WP_TIMEOUT_CAP_SECS), 30);
        assert_eq!(effective_timeout(Some(45), 30, WP_TIMEOUT_CAP_SECS), 45);
        assert_eq!(effective_timeout(None, 120, WP_TIMEOUT_CAP_SECS), 60);
    }
}
