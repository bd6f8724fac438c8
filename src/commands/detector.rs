//! Natural-language command detection.
//!
//! [`CommandDetector`] maps a chat message to a structured WP-CLI or PHP
//! command. Classifiers run in a fixed order and the first one that produces
//! a command wins; explicit `wp `/`php ` commands always come first.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CommandError, CommandResult};
use crate::logging::{self, Category};

use super::result::Parameters;

/// Kind of command a message was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Explicit,
    PhpVersion,
    PluginList,
    PluginStatus,
    PluginUpdate,
    ThemeList,
    CurrentTheme,
    WpVersion,
    SystemInfo,
    DbInfo,
    UserList,
    DbStatus,
}

impl CommandKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::PhpVersion => "php_version",
            Self::PluginList => "plugin_list",
            Self::PluginStatus => "plugin_status",
            Self::PluginUpdate => "plugin_update",
            Self::ThemeList => "theme_list",
            Self::CurrentTheme => "current_theme",
            Self::WpVersion => "wp_version",
            Self::SystemInfo => "system_info",
            Self::DbInfo => "db_info",
            Self::UserList => "user_list",
            Self::DbStatus => "db_status",
        }
    }
}

/// A classified message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub command: String,
    pub parameters: Parameters,
}

impl DetectedCommand {
    fn new(kind: CommandKind, command: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.into(),
            parameters: Parameters::new(),
        }
    }

    fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters
            .insert(key.to_string(), Value::String(value.into()));
        self
    }
}

/// Detector contract used by the handler.
pub trait Detect: Send + Sync {
    fn detect_command(&self, message: &str) -> Option<DetectedCommand>;
}

// === Pattern groups ===

const PHP_VERSION: &[&str] = &[
    r"\bphp\s+version\b",
    r"\bversion\s+of\s+php\b",
    r"\bphp\s+ver\b",
    r"\bwhich\s+php\b",
    r"\bwhat\s+php\b",
    r"\bphp\s+info\b",
    r"\bphpinfo\b",
    r"\bphp\s+-v\b",
    r"\brunning\s+php\b",
    r"\bphp\s+(is\s+)?(running|installed|used)\b",
    r"\bphp\s+(configuration|config|settings|details|environment|extensions)\b",
    r"\bphp\b.*\bversion\b",
    r"\bversion\b.*\bphp\b",
    r"\bphp\s+release\b",
    r"\bcheck\s+(the\s+)?php\b",
];

const PLUGIN_MENTION: &[&str] = &[r"\bplug-?ins?\b"];

const PLUGIN_UPDATE: &[&str] = &[
    r"\b(update|upgrade)",
    r"\boutdated\b",
    r"\bout\s+of\s+date\b",
    r"\bnewer\s+version",
];

const PLUGIN_STATUS: &[&str] = &[
    r"\bstatus\b",
    r"\b(info|information|details)\b",
    r"\bis\s+(the\s+)?[\w-]+\s+(plug-?in\s+)?(active|activated|enabled|installed|running)\b",
    r"\bis\s+.*\bplug-?in\b.*\b(active|activated|enabled|installed|running)\b",
];

const PLUGIN_NAME: &str = r"\b(?:is|of|about|on|for)\s+(?:the\s+)?([a-z0-9][a-z0-9_-]*)\s+plug-?in\b";

const PLUGIN_LIST: &[&str] = &[
    r"\b(list|show|display|get|see|view|tell|give|print)\b",
    r"\b(what|which|how\s+many|all|any)\b",
    r"\b(installed|active|inactive|enabled|disabled|activated|deactivated)\b",
    r"\bplug-?ins\b",
];

const THEME_MENTION: &[&str] = &[r"\bthemes?\b"];

const THEME_LIST: &[&str] = &[
    r"\bthemes\b.*\b(installed|available)\b",
    r"\b(list|show|display|all|installed|available|what|which)\b.*\bthemes\b",
    r"\bhow\s+many\s+themes\b",
];

const CURRENT_THEME: &[&str] = &[
    r"\b(current|currently|active|activated|enabled|using|used|live)\b",
    r"\bin\s+use\b",
    r"\b(what|which)\s+theme\b",
    r"\b(show|get|tell)\b.*\btheme\b",
];

const WP_VERSION: &[&str] = &[
    r"\b(wordpress|wp)\s+version\b",
    r"\bversion\s+of\s+(wordpress|wp)\b",
    r"\bwhich\s+(wordpress|wp)\b",
    r"\bwordpress\b.*\bversion\b",
    r"\bversion\b.*\bwordpress\b",
    r"\bcore\s+version\b",
];

const SYSTEM_INFO: &[&str] = &[
    r"\bsite\s+health\b",
    r"\bsystem\s+(info|information|status|details|report)\b",
    r"\bserver\s+(info|information|details|environment)\b",
    r"\b(environment|hosting)\s+(info|information|details)\b",
    r"\bdebug\s+info",
];

const DB_INFO: &[&str] = &[
    r"\b(database|db)\s+(info|information|details|size)\b",
    r"\bsize\s+of\s+(the\s+)?(database|db)\b",
    r"\bhow\s+(big|large)\s+is\s+(the\s+)?(database|db)\b",
    r"\b(database|db)\s+tables\b",
];

const USER_MENTION: &[&str] =
    &[r"\b(users?|members|accounts|administrators|admins|editors|authors|subscribers|contributors)\b"];

const USER_LIST: &[&str] = &[
    r"\b(list|show|display|get|see|view|all|what|which|who|how\s+many)\b",
    r"\b(users|members|accounts)\b",
    r"\b(admins|administrators|editors|authors|subscribers|contributors)\b",
];

const USER_ROLE: &str = r"\b(administrator|admin|editor|author|contributor|subscriber)s?\b";

const DB_MENTION: &[&str] = &[r"\b(database|db)\b"];

const DB_STATUS: &[&str] = &[
    r"\b(status|health|healthy|check|working|connected|connection|ok|up|running|errors?)\b",
    r"\bcorrupt",
];

/// Words that look like a plugin slug in "status of the X plugin" but are not.
const NOT_A_PLUGIN_NAME: &[&str] = &[
    "the", "a", "an", "my", "all", "any", "this", "that", "each", "every", "installed", "active",
    "inactive", "wordpress", "wp",
];

struct Patterns {
    php_version: Vec<Regex>,
    plugin_mention: Vec<Regex>,
    plugin_update: Vec<Regex>,
    plugin_status: Vec<Regex>,
    plugin_name: Regex,
    plugin_list: Vec<Regex>,
    theme_mention: Vec<Regex>,
    theme_list: Vec<Regex>,
    current_theme: Vec<Regex>,
    wp_version: Vec<Regex>,
    system_info: Vec<Regex>,
    db_info: Vec<Regex>,
    user_mention: Vec<Regex>,
    user_list: Vec<Regex>,
    user_role: Regex,
    db_mention: Vec<Regex>,
    db_status: Vec<Regex>,
}

impl Patterns {
    fn compile() -> CommandResult<Self> {
        Ok(Self {
            php_version: compile_group("php_version", PHP_VERSION)?,
            plugin_mention: compile_group("plugin_mention", PLUGIN_MENTION)?,
            plugin_update: compile_group("plugin_update", PLUGIN_UPDATE)?,
            plugin_status: compile_group("plugin_status", PLUGIN_STATUS)?,
            plugin_name: compile_one("plugin_name", PLUGIN_NAME)?,
            plugin_list: compile_group("plugin_list", PLUGIN_LIST)?,
            theme_mention: compile_group("theme_mention", THEME_MENTION)?,
            theme_list: compile_group("theme_list", THEME_LIST)?,
            current_theme: compile_group("current_theme", CURRENT_THEME)?,
            wp_version: compile_group("wp_version", WP_VERSION)?,
            system_info: compile_group("system_info", SYSTEM_INFO)?,
            db_info: compile_group("db_info", DB_INFO)?,
            user_mention: compile_group("user_mention", USER_MENTION)?,
            user_list: compile_group("user_list", USER_LIST)?,
            user_role: compile_one("user_role", USER_ROLE)?,
            db_mention: compile_group("db_mention", DB_MENTION)?,
            db_status: compile_group("db_status", DB_STATUS)?,
        })
    }
}

fn compile_one(group: &'static str, pattern: &str) -> CommandResult<Regex> {
    Regex::new(pattern).map_err(|source| CommandError::InvalidPattern {
        table: "detector",
        rule: group,
        source,
    })
}

fn compile_group(group: &'static str, patterns: &[&str]) -> CommandResult<Vec<Regex>> {
    patterns.iter().map(|p| compile_one(group, p)).collect()
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

// === Classifiers ===

type Classifier = fn(&Patterns, &str, &str) -> Option<DetectedCommand>;

/// Evaluation order is significant: first match wins.
const CLASSIFIERS: &[(&str, Classifier)] = &[
    ("explicit", classify_explicit),
    ("php_version", classify_php_version),
    ("plugin", classify_plugin),
    ("theme", classify_theme),
    ("system", classify_system),
    ("user", classify_user),
    ("database", classify_database),
];

fn classify_explicit(_: &Patterns, message: &str, lower: &str) -> Option<DetectedCommand> {
    (lower.starts_with("wp ") || lower.starts_with("php "))
        .then(|| DetectedCommand::new(CommandKind::Explicit, message))
}

fn classify_php_version(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    any_match(&p.php_version, lower).then(|| DetectedCommand::new(CommandKind::PhpVersion, "php -v"))
}

fn classify_plugin(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    if !any_match(&p.plugin_mention, lower) {
        return None;
    }

    if any_match(&p.plugin_update, lower) {
        return Some(
            DetectedCommand::new(CommandKind::PluginUpdate, "wp plugin list --update=available")
                .with_param("update", "available"),
        );
    }

    if any_match(&p.plugin_status, lower) {
        let name = p
            .plugin_name
            .captures(lower)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !NOT_A_PLUGIN_NAME.contains(name));
        return Some(match name {
            Some(name) => DetectedCommand::new(
                CommandKind::PluginStatus,
                format!("wp plugin status {name}"),
            )
            .with_param("plugin_name", name),
            None => DetectedCommand::new(CommandKind::PluginStatus, "wp plugin status"),
        });
    }

    if any_match(&p.plugin_list, lower) {
        let detected = DetectedCommand::new(CommandKind::PluginList, "wp plugin list");
        return Some(match status_filter(lower) {
            Some(status) => detected.with_param("status", status),
            None => detected,
        });
    }

    None
}

fn classify_theme(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    if !any_match(&p.theme_mention, lower) {
        return None;
    }

    if any_match(&p.theme_list, lower) {
        let detected = DetectedCommand::new(CommandKind::ThemeList, "wp theme list");
        return Some(match status_filter(lower) {
            Some(status) => detected.with_param("status", status),
            None => detected,
        });
    }

    any_match(&p.current_theme, lower).then(|| {
        DetectedCommand::new(CommandKind::CurrentTheme, "wp theme list --status=active")
            .with_param("status", "active")
    })
}

fn classify_system(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    if any_match(&p.wp_version, lower) {
        return Some(DetectedCommand::new(CommandKind::WpVersion, "wp core version"));
    }
    if any_match(&p.system_info, lower) {
        return Some(DetectedCommand::new(
            CommandKind::SystemInfo,
            "wp core version --extra",
        ));
    }
    any_match(&p.db_info, lower).then(|| DetectedCommand::new(CommandKind::DbInfo, "wp db size"))
}

fn classify_user(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    if !any_match(&p.user_mention, lower) || !any_match(&p.user_list, lower) {
        return None;
    }

    let detected = DetectedCommand::new(CommandKind::UserList, "wp user list");
    let role = p
        .user_role
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .map(|m| match m.as_str() {
            "admin" => "administrator",
            other => other,
        });
    Some(match role {
        Some(role) => detected.with_param("role", role),
        None => detected,
    })
}

fn classify_database(p: &Patterns, _: &str, lower: &str) -> Option<DetectedCommand> {
    (any_match(&p.db_mention, lower) && any_match(&p.db_status, lower))
        .then(|| DetectedCommand::new(CommandKind::DbStatus, "wp db check"))
}

/// `inactive` wins over `active` because one contains the other.
fn status_filter(lower: &str) -> Option<&'static str> {
    if ["inactive", "disabled", "deactivated"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Some("inactive")
    } else if ["active", "enabled", "activated"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Some("active")
    } else {
        None
    }
}

// === Detector ===

/// The full natural-language detector.
pub struct CommandDetector {
    patterns: Patterns,
}

impl CommandDetector {
    pub fn new() -> CommandResult<Self> {
        Ok(Self {
            patterns: Patterns::compile()?,
        })
    }
}

impl Detect for CommandDetector {
    fn detect_command(&self, message: &str) -> Option<DetectedCommand> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        let lower = message.to_lowercase();

        for (name, classify) in CLASSIFIERS {
            if let Some(detected) = classify(&self.patterns, message, &lower) {
                logging::debug(
                    Category::Detector,
                    format!(
                        "Classifier '{name}' matched as {} -> {}",
                        detected.kind.as_str(),
                        detected.command
                    ),
                );
                return Some(detected);
            }
        }

        logging::debug(Category::Detector, "No classifier matched");
        None
    }
}
