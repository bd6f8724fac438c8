//! Named danger rule tables.
//!
//! Three independent tables exist on purpose. The security filter owns the
//! generic and WordPress tables; the WP-CLI executor owns its own blacklist
//! and checks it again right before execution. Coverage overlaps but is not
//! identical, so a command reaching the executor must pass both.
//!
//! Rules are not anchored at the end of input, so appending text to a
//! flagged command keeps it flagged. The one exception is the primary admin
//! rule: user ID `1` must end on a token boundary, otherwise `wp user delete
//! 10` would be refused. Appending digits to that token names a different
//! user, which is why it stops matching.
//!
//! Tables match the raw command. [`RuleTable::vet`] also matches its
//! [`canonical_form`], which takes quoting and flag order out of play.

use regex::Regex;

use crate::error::{CommandError, CommandResult};

/// Generic shell, SQL and PHP constructs checked by the security filter.
pub const SECURITY_FILTER_RULES: &[(&str, &str)] = &[
    ("rm_recursive", r"(?i)\brm\s+(-[a-z]*r|--recursive)"),
    ("chmod_recursive", r"(?i)\bchmod\s+(-[a-z]*r|--recursive)"),
    ("chown_recursive", r"(?i)\bchown\s+(-[a-z]*r|--recursive)"),
    (
        "sql_drop",
        r"(?i)\bdrop\s+(table|database|schema|view|index|procedure|trigger)",
    ),
    ("sql_truncate", r"(?i)\btruncate\s+(table\s+)?[\w`]"),
    ("sql_delete", r"(?i)\bdelete\s+from\s"),
    ("sql_alter_drop", r"(?i)\balter\s+table\s+\S+\s+drop\s"),
    ("sql_grant", r"(?i)\bgrant\s+(all|super|file)"),
    ("php_system", r"(?i)\bsystem\s*\("),
    ("php_exec", r"(?i)\bexec\s*\("),
    ("php_shell_exec", r"(?i)\bshell_exec\s*\("),
    ("php_passthru", r"(?i)\bpassthru\s*\("),
    ("php_popen", r"(?i)\b(popen|proc_open)\s*\("),
    ("php_eval", r"(?i)\b(eval|assert|create_function)\s*\("),
    ("php_base64_decode", r"(?i)\bbase64_decode\s*\("),
    ("backtick_exec", r"`[^`]*`"),
    ("network_curl", r"(?i)\bcurl\s"),
    ("network_wget", r"(?i)\bwget\s"),
    ("network_netcat", r"(?i)\b(nc|ncat|netcat)\s+\S"),
    ("write_etc", r"(?i)(>\s*|\b(tee|cp|mv|ln)\s+(\S+\s+)*)/etc/"),
    ("write_webroot", r"(?i)(>\s*|\b(tee|cp|mv|ln)\s+(\S+\s+)*)/var/www"),
    ("shell_and", r"&&"),
    ("shell_or", r"\|\|"),
    ("shell_separator", r";"),
    ("shell_pipe", r"\|"),
    ("shell_substitution", r"\$\("),
    ("fork_bomb", r":\(\)\s*\{"),
    ("disk_dd", r"(?i)\bdd\s+(\S+\s+)*(if|of)="),
    ("disk_mkfs", r"(?i)\bmkfs"),
    ("raw_device", r"(?i)/dev/(sd|hd|nvme|xvd|vd|disk)[a-z0-9]"),
    ("privilege_sudo", r"(?i)\bsudo\s"),
];

/// WordPress operations that are destructive or hijack the site.
pub const WORDPRESS_FILTER_RULES: &[(&str, &str)] = &[
    (
        "wp_core_force_update",
        r"(?i)\bwp\s+core\s+(update|download)\s.*--force",
    ),
    (
        "wp_install_from_url",
        r"(?i)\bwp\s+(plugin|theme)\s+install\s.*https?:",
    ),
    (
        "wp_db_query_write",
        r"(?i)\bwp\s+db\s+query\s.*\b(drop|truncate|delete|alter|update|insert|replace|grant|create)\b",
    ),
    ("wp_db_destroy", r"(?i)\bwp\s+db\s+(drop|reset|clean|import)\b"),
    (
        "wp_delete_primary_admin",
        r"(?i)\bwp\s+user\s+delete\s+(\S+\s+)*1(\s|$)",
    ),
    (
        "wp_protected_option",
        r"(?i)\bwp\s+option\s+(update|delete|set|add|patch)\s+(siteurl|home|active_plugins)\b",
    ),
    ("wp_site_destroy", r"(?i)\bwp\s+site\s+(delete|empty)\b"),
    ("wp_search_replace", r"(?i)\bwp\s+search-replace\s"),
    (
        "wp_config_write",
        r"(?i)\bwp\s+config\s+(set|delete|shuffle-salts)\b",
    ),
];

/// The WP-CLI executor's own blacklist.
pub const EXECUTOR_BLACKLIST_RULES: &[(&str, &str)] = &[
    ("rm_forced_or_recursive", r"(?i)\brm\s+-[a-z]*[rf]"),
    ("sudo", r"(?i)\bsudo\b"),
    ("su_login", r"(?i)\bsu\s+-"),
    ("power_state", r"(?i)\b(shutdown|reboot|halt|poweroff)\b"),
    ("init_runlevel", r"(?i)\binit\s+[06]\b"),
    ("mkfs", r"(?i)\bmkfs"),
    ("shred", r"(?i)\bshred\s"),
    ("dd", r"(?i)\bdd\s+if="),
    ("chmod_777", r"(?i)\bchmod\s+(-\S+\s+)*0?777"),
    ("chown_recursive", r"(?i)\bchown\s+-[a-z]*r"),
    (
        "php_process_control",
        r"(?i)\b(pcntl_[a-z_]+|posix_kill|posix_setuid|posix_setsid|proc_open|proc_terminate|proc_nice)\s*\(",
    ),
    (
        "php_command_exec",
        r"(?i)\b(system|exec|shell_exec|passthru|popen)\s*\(",
    ),
    ("pipe_to_shell", r"(?i)\|\s*(ba|z|da|k)?sh\b"),
    ("fetch_to_shell", r"(?i)\b(curl|wget)\s.*\b(ba|z|da)?sh\b"),
    ("fork_bomb", r":\(\)\s*\{"),
    ("device_write", r"(?i)>\s*/dev/(sd|hd|nvme)"),
    ("kill_all", r"(?i)\b(killall|pkill)\b|\bkill\s+-9\s+-?1\b"),
    ("crontab_remove", r"(?i)\bcrontab\s+-r"),
    ("wp_eval", r"(?i)\bwp\s+eval(-file)?\b"),
    ("wp_shell", r"(?i)\bwp\s+shell\b"),
    ("wp_db_drop", r"(?i)\bwp\s+db\s+(drop|reset)\b"),
    ("wp_delete_primary_admin", r"(?i)\bwp\s+user\s+delete\s+1\b"),
    ("wp_package_install", r"(?i)\bwp\s+package\s+install\b"),
];

/// One compiled rule.
#[derive(Debug, Clone)]
pub struct DangerRule {
    pub name: &'static str,
    pattern: Regex,
}

impl DangerRule {
    #[must_use]
    pub fn is_match(&self, command: &str) -> bool {
        self.pattern.is_match(command)
    }
}

/// An ordered, immutable list of rules. First match wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    name: &'static str,
    rules: Vec<DangerRule>,
}

impl RuleTable {
    /// Compile a table. Fails if any pattern is invalid.
    pub fn compile(name: &'static str, specs: &[(&'static str, &'static str)]) -> CommandResult<Self> {
        let rules = specs
            .iter()
            .map(|&(rule, pattern)| {
                Regex::new(pattern)
                    .map(|pattern| DangerRule {
                        name: rule,
                        pattern,
                    })
                    .map_err(|source| CommandError::InvalidPattern {
                        table: name,
                        rule,
                        source,
                    })
            })
            .collect::<CommandResult<Vec<_>>>()?;
        Ok(Self { name, rules })
    }

    pub fn security_filter() -> CommandResult<Self> {
        Self::compile("security_filter", SECURITY_FILTER_RULES)
    }

    pub fn wordpress_filter() -> CommandResult<Self> {
        Self::compile("wordpress_filter", WORDPRESS_FILTER_RULES)
    }

    pub fn executor_blacklist() -> CommandResult<Self> {
        Self::compile("executor_blacklist", EXECUTOR_BLACKLIST_RULES)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Name of the first rule matching `command`.
    #[must_use]
    pub fn first_match(&self, command: &str) -> Option<&'static str> {
        self.rules
            .iter()
            .find(|rule| rule.is_match(command))
            .map(|rule| rule.name)
    }

    /// Like [`first_match`](Self::first_match), then retried on the
    /// canonical form when the raw text passes.
    #[must_use]
    pub fn vet(&self, command: &str) -> Option<&'static str> {
        self.first_match(command).or_else(|| {
            let canonical = canonical_form(command);
            if canonical == command {
                None
            } else {
                self.first_match(&canonical)
            }
        })
    }
}

/// The command as the shell would see its words: quotes removed, single
/// spaces between tokens, and `-`-prefixed options after the positionals.
///
/// `wp option update --autoload=no 'home' x` becomes
/// `wp option update home x --autoload=no`. Unbalanced input falls back to
/// whitespace splitting with quote characters dropped.
#[must_use]
pub fn canonical_form(command: &str) -> String {
    let tokens = shlex::split(command).unwrap_or_else(|| {
        command
            .split_whitespace()
            .map(|token| token.replace(['\'', '"'], ""))
            .collect()
    });
    let (options, positionals): (Vec<String>, Vec<String>) = tokens
        .into_iter()
        .filter(|token| !token.is_empty())
        .partition(|token| token.starts_with('-'));
    positionals
        .into_iter()
        .chain(options)
        .collect::<Vec<_>>()
        .join(" ")
}
