//! WordPress host surface consumed by the executors.
//!
//! The command pipeline never talks to WordPress directly. It goes through
//! [`WordPress`] (plugins, users, posts, options, themes, menus, comments,
//! database and PHP runtime introspection) and the optional [`ActivityLog`]
//! collaborator that records plugin activity.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandResult;

pub mod memory;

pub use memory::InMemorySite;

// === Types ===

/// An installed plugin as reported by the plugin registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    /// Plugin file relative to the plugins directory, e.g. `akismet/akismet.php`.
    pub file: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub active: bool,
    /// Newer version offered by the update feed, if any.
    #[serde(default)]
    pub update_version: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
}

impl Plugin {
    /// WP-CLI style slug: the plugin directory, or the file stem for single-file plugins.
    #[must_use]
    pub fn slug(&self) -> &str {
        match self.file.split_once('/') {
            Some((dir, _)) => dir,
            None => self.file.trim_end_matches(".php"),
        }
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        if self.active { "active" } else { "inactive" }
    }

    #[must_use]
    pub fn update_available(&self) -> bool {
        self.update_version.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub registered: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default = "default_post_status")]
    pub status: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub author: u64,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_post_status() -> String {
    "publish".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub stylesheet: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub update_version: Option<String>,
}

impl Theme {
    #[must_use]
    pub fn status(&self) -> &'static str {
        if self.active { "active" } else { "inactive" }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavMenu {
    pub term_id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub post_id: u64,
    pub author: String,
    #[serde(default)]
    pub date: String,
    /// One of `approved`, `hold`, `spam`, `trash`.
    #[serde(default = "default_comment_status")]
    pub status: String,
    #[serde(default)]
    pub content: String,
}

fn default_comment_status() -> String {
    "approved".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbTable {
    pub name: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default = "default_table_status")]
    pub status: String,
}

fn default_table_status() -> String {
    "OK".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreVersion {
    pub wordpress: String,
    #[serde(default)]
    pub database: u32,
    #[serde(default)]
    pub tinymce: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en_US".to_string()
}

/// Runtime facts about the PHP interpreter serving the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhpRuntime {
    pub version: String,
    pub os: String,
    pub sapi: String,
    pub memory_limit: String,
    pub max_execution_time: u32,
    pub upload_max_filesize: String,
    pub post_max_size: String,
    pub max_input_vars: u32,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Default for PhpRuntime {
    fn default() -> Self {
        Self {
            version: "8.2.0".to_string(),
            os: std::env::consts::OS.to_string(),
            sapi: "cli".to_string(),
            memory_limit: "256M".to_string(),
            max_execution_time: 30,
            upload_max_filesize: "64M".to_string(),
            post_max_size: "64M".to_string(),
            max_input_vars: 1000,
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub role: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PostQuery {
    pub post_type: String,
    /// `None` or `any` returns every status except `trash`.
    pub status: Option<String>,
    pub limit: Option<usize>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            post_type: default_post_type(),
            status: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub status: Option<String>,
    pub post_id: Option<u64>,
    pub limit: Option<usize>,
}

// === Activity log ===

/// One recorded plugin lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub plugin_name: String,
    #[serde(default)]
    pub plugin_slug: String,
    /// `activated`, `deactivated`, `installed`, `updated` or `deleted`.
    pub action: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub action: Option<String>,
    pub plugin: Option<String>,
}

impl LogQuery {
    #[must_use]
    pub fn matches(&self, entry: &ActivityEntry) -> bool {
        if let Some(since) = self.since
            && entry.timestamp < since
        {
            return false;
        }
        if let Some(action) = &self.action
            && !entry.action.eq_ignore_ascii_case(action)
        {
            return false;
        }
        if let Some(plugin) = &self.plugin {
            let plugin = plugin.to_lowercase();
            if !entry.plugin_slug.to_lowercase().contains(&plugin)
                && !entry.plugin_name.to_lowercase().contains(&plugin)
            {
                return false;
            }
        }
        true
    }
}

/// Per-action and per-plugin counts over a day window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub days: u32,
    pub total: usize,
    pub actions: BTreeMap<String, usize>,
    pub plugins: BTreeMap<String, usize>,
}

impl ActivitySummary {
    #[must_use]
    pub fn from_entries(days: u32, entries: &[ActivityEntry]) -> Self {
        let mut summary = Self {
            days,
            ..Self::default()
        };
        for entry in entries {
            summary.total += 1;
            *summary
                .actions
                .entry(entry.action.to_lowercase())
                .or_default() += 1;
            *summary
                .plugins
                .entry(entry.plugin_name.clone())
                .or_default() += 1;
        }
        summary
    }
}

// === Traits ===

/// The subset of the WordPress API the direct-API executor relies on.
pub trait WordPress: Send + Sync {
    fn plugins(&self) -> CommandResult<Vec<Plugin>>;

    /// Activate or deactivate a plugin by slug, returning its new state.
    fn set_plugin_active(&self, slug: &str, active: bool) -> CommandResult<Plugin>;

    fn users(&self, query: &UserQuery) -> CommandResult<Vec<User>>;

    fn posts(&self, query: &PostQuery) -> CommandResult<Vec<Post>>;

    fn option(&self, name: &str) -> CommandResult<Option<Value>>;

    fn options(&self) -> CommandResult<Vec<(String, Value)>>;

    /// Returns `false` when the stored value was already equal.
    fn update_option(&self, name: &str, value: Value) -> CommandResult<bool>;

    fn themes(&self) -> CommandResult<Vec<Theme>>;

    fn nav_menus(&self) -> CommandResult<Vec<NavMenu>>;

    fn comments(&self, query: &CommentQuery) -> CommandResult<Vec<Comment>>;

    fn core_version(&self) -> CommandResult<CoreVersion>;

    fn db_tables(&self) -> CommandResult<Vec<DbTable>>;

    fn db_prefix(&self) -> String {
        "wp_".to_string()
    }

    fn php_runtime(&self) -> PhpRuntime {
        PhpRuntime::default()
    }
}

/// Start of the `days`-long window ending at `now`, or `None` when that
/// falls outside the representable range and the window is unbounded.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
}

/// Plugin activity logger.
pub trait ActivityLog: Send + Sync {
    fn logs(&self, query: &LogQuery) -> CommandResult<Vec<ActivityEntry>>;

    fn activity_summary(&self, days: u32) -> CommandResult<ActivitySummary> {
        let query = LogQuery {
            since: window_start(Utc::now(), days),
            ..LogQuery::default()
        };
        let entries = self.logs(&query)?;
        Ok(ActivitySummary::from_entries(days, &entries))
    }
}
