//! Category-scoped logging helpers over `tracing`.
//!
//! Every message carries a [`Category`] field. Without an installed subscriber
//! the calls are no-ops, so components can log unconditionally.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::EnvFilter;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Subsystem a log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Security,
    Detector,
    Executor,
    Handler,
    Adapter,
    Config,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Detector => "detector",
            Self::Executor => "executor",
            Self::Handler => "handler",
            Self::Adapter => "adapter",
            Self::Config => "config",
        }
    }
}

/// Enable or disable verbose logging output.
pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::SeqCst);
}

/// Check whether verbose logging is enabled.
#[must_use]
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Install the stderr subscriber used by the binary.
///
/// `RUST_LOG` wins when set; otherwise the level is `info` in verbose mode
/// and `warn` otherwise. Calling this twice is harmless.
pub fn init(verbose: bool) {
    set_verbose(verbose);
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn debug(category: Category, message: impl AsRef<str>) {
    tracing::debug!(category = category.as_str(), "{}", message.as_ref());
}

pub fn info(category: Category, message: impl AsRef<str>) {
    tracing::info!(category = category.as_str(), "{}", message.as_ref());
}

pub fn warn(category: Category, message: impl AsRef<str>) {
    tracing::warn!(category = category.as_str(), "{}", message.as_ref());
}

pub fn error(category: Category, message: impl AsRef<str>) {
    tracing::error!(category = category.as_str(), "{}", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_without_subscriber_is_noop() {
        info(Category::Handler, "no subscriber installed");
        error(Category::Security, "still fine");
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Security.as_str(), "security");
        assert_eq!(Category::Executor.as_str(), "executor");
    }

    #[test]
    fn test_verbose_flag_round_trips() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
