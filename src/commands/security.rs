//! Command security filter.
//!
//! Permissive blacklist: a command is dangerous when it mentions a sensitive
//! file, equals or contains a high-impact WP-CLI command, or matches one of
//! the generic or WordPress rule tables. The verdict is strictly boolean to
//! callers; the matched rule only ever reaches the log.

use regex::Regex;

use crate::error::{CommandError, CommandResult};
use crate::logging::{self, Category};

use super::rules::{RuleTable, canonical_form};

/// Files whose mere mention blocks a command (case-insensitive substring).
pub const SENSITIVE_FILES: &[&str] = &[
    "wp-config.php",
    ".htaccess",
    ".env",
    "/etc/passwd",
    "/etc/shadow",
    "/etc/hosts",
];

/// Literal WP-CLI commands with site-wide impact.
pub const HIGH_IMPACT_COMMANDS: &[&str] = &[
    "wp plugin deactivate --all",
    "wp plugin delete --all",
    "wp plugin uninstall --all",
    "wp theme delete --all",
    "wp db reset",
    "wp db drop",
    "wp db clean",
    "wp site delete",
    "wp site empty",
    "wp user delete 1",
    "wp core update --force",
];

/// Secrets redacted from commands before they are logged.
const REDACTIONS: &[(&str, &str)] = &[
    ("password", r"(?i)(--(?:user_)?pass(?:word)?=)\S+"),
    ("short_password", r"(-p\s+)\S+"),
    ("key", r"(?i)(--(?:api-)?key=)\S+"),
];

const REDACTED: &str = "********";

/// Outcome of a security check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityVerdict {
    Safe,
    Dangerous { rule: String },
}

impl SecurityVerdict {
    #[must_use]
    pub fn is_dangerous(&self) -> bool {
        matches!(self, Self::Dangerous { .. })
    }
}

/// Security filter contract used by the handler.
pub trait SecurityCheck: Send + Sync {
    fn check(&self, command: &str) -> SecurityVerdict;

    fn is_dangerous(&self, command: &str) -> bool {
        self.check(command).is_dangerous()
    }

    fn get_safe_command_for_logging(&self, command: &str) -> String;
}

/// The full security filter.
#[derive(Debug, Clone)]
pub struct CommandSecurity {
    generic: RuleTable,
    wordpress: RuleTable,
    redactions: Vec<Regex>,
}

impl CommandSecurity {
    /// Build with the built-in rule tables.
    pub fn new() -> CommandResult<Self> {
        Self::with_tables(RuleTable::security_filter()?, RuleTable::wordpress_filter()?)
    }

    pub fn with_tables(generic: RuleTable, wordpress: RuleTable) -> CommandResult<Self> {
        let redactions = REDACTIONS
            .iter()
            .map(|&(rule, pattern)| {
                Regex::new(pattern).map_err(|source| CommandError::InvalidPattern {
                    table: "redactions",
                    rule,
                    source,
                })
            })
            .collect::<CommandResult<Vec<_>>>()?;
        Ok(Self {
            generic,
            wordpress,
            redactions,
        })
    }
}

impl SecurityCheck for CommandSecurity {
    fn check(&self, command: &str) -> SecurityVerdict {
        let command = command.trim();
        if command.is_empty() {
            return SecurityVerdict::Safe;
        }

        let canonical = canonical_form(command);
        let rule = self.find_rule(command).or_else(|| {
            if canonical == command {
                None
            } else {
                self.find_rule(&canonical)
            }
        });

        match rule {
            Some(rule) => {
                logging::warn(
                    Category::Security,
                    format!(
                        "Dangerous command detected ({rule}): {}",
                        self.get_safe_command_for_logging(command)
                    ),
                );
                SecurityVerdict::Dangerous { rule }
            }
            None => SecurityVerdict::Safe,
        }
    }

    fn get_safe_command_for_logging(&self, command: &str) -> String {
        redact(&self.redactions, command)
    }
}

impl CommandSecurity {
    fn find_rule(&self, command: &str) -> Option<String> {
        let lower = command.to_lowercase();
        sensitive_file(&lower)
            .map(|file| format!("sensitive_file:{file}"))
            .or_else(|| high_impact(&lower).map(|cmd| format!("high_impact:{cmd}")))
            .or_else(|| {
                self.generic
                    .first_match(command)
                    .map(|rule| format!("{}:{rule}", self.generic.name()))
            })
            .or_else(|| {
                self.wordpress
                    .first_match(command)
                    .map(|rule| format!("{}:{rule}", self.wordpress.name()))
            })
    }
}

fn sensitive_file(lower: &str) -> Option<&'static str> {
    SENSITIVE_FILES.iter().copied().find(|file| lower.contains(file))
}

fn high_impact(lower: &str) -> Option<&'static str> {
    let normalized = lower.split_whitespace().collect::<Vec<_>>().join(" ");
    HIGH_IMPACT_COMMANDS
        .iter()
        .copied()
        .find(|cmd| normalized.contains(cmd))
}

pub(crate) fn redact(redactions: &[Regex], command: &str) -> String {
    redactions.iter().fold(command.to_string(), |acc, re| {
        re.replace_all(&acc, format!("${{1}}{REDACTED}").as_str())
            .into_owned()
    })
}
