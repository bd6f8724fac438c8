//! In-memory site used by the CLI (`--site fixture.toml`) and by tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{CommandError, CommandResult};

use super::{
    ActivityEntry, ActivityLog, Comment, CommentQuery, CoreVersion, DbTable, LogQuery, NavMenu,
    PhpRuntime, Plugin, Post, PostQuery, Theme, User, UserQuery, WordPress,
};

/// Serializable snapshot of a site. This is the fixture file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteData {
    #[serde(default)]
    pub core: Option<CoreVersion>,
    #[serde(default)]
    pub php: Option<PhpRuntime>,
    #[serde(default)]
    pub db_prefix: Option<String>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub menus: Vec<NavMenu>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
    #[serde(default)]
    pub tables: Vec<DbTable>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

/// A [`WordPress`] and [`ActivityLog`] implementation over [`SiteData`].
pub struct InMemorySite {
    data: Mutex<SiteData>,
}

impl InMemorySite {
    #[must_use]
    pub fn new(data: SiteData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    /// Parse a TOML fixture.
    pub fn from_toml_str(contents: &str) -> CommandResult<Self> {
        let data: SiteData = toml::from_str(contents)
            .map_err(|e| CommandError::config(format!("invalid site fixture: {e}")))?;
        Ok(Self::new(data))
    }

    /// Load a TOML fixture from disk.
    pub fn from_path(path: &Path) -> CommandResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// A small but complete demo site.
    #[must_use]
    pub fn sample() -> Self {
        Self::new(sample_data())
    }

    fn lock(&self) -> CommandResult<MutexGuard<'_, SiteData>> {
        self.data
            .lock()
            .map_err(|_| CommandError::site("site state lock poisoned"))
    }
}

impl WordPress for InMemorySite {
    fn plugins(&self) -> CommandResult<Vec<Plugin>> {
        Ok(self.lock()?.plugins.clone())
    }

    fn set_plugin_active(&self, slug: &str, active: bool) -> CommandResult<Plugin> {
        let mut data = self.lock()?;
        let plugin = data
            .plugins
            .iter_mut()
            .find(|p| p.slug().eq_ignore_ascii_case(slug))
            .ok_or_else(|| CommandError::not_found("Plugin", slug))?;
        plugin.active = active;
        let updated = plugin.clone();

        let active_files: Vec<Value> = data
            .plugins
            .iter()
            .filter(|p| p.active)
            .map(|p| Value::String(p.file.clone()))
            .collect();
        data.options
            .insert("active_plugins".to_string(), Value::Array(active_files));
        Ok(updated)
    }

    fn users(&self, query: &UserQuery) -> CommandResult<Vec<User>> {
        let data = self.lock()?;
        let users = data
            .users
            .iter()
            .filter(|u| {
                query
                    .role
                    .as_ref()
                    .is_none_or(|role| u.roles.iter().any(|r| r.eq_ignore_ascii_case(role)))
            })
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(users)
    }

    fn posts(&self, query: &PostQuery) -> CommandResult<Vec<Post>> {
        let data = self.lock()?;
        let posts = data
            .posts
            .iter()
            .filter(|p| p.post_type.eq_ignore_ascii_case(&query.post_type))
            .filter(|p| match query.status.as_deref() {
                None | Some("any") => p.status != "trash",
                Some(status) => p.status.eq_ignore_ascii_case(status),
            })
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(posts)
    }

    fn option(&self, name: &str) -> CommandResult<Option<Value>> {
        Ok(self.lock()?.options.get(name).cloned())
    }

    fn options(&self) -> CommandResult<Vec<(String, Value)>> {
        Ok(self
            .lock()?
            .options
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn update_option(&self, name: &str, value: Value) -> CommandResult<bool> {
        let mut data = self.lock()?;
        if data.options.get(name) == Some(&value) {
            return Ok(false);
        }
        data.options.insert(name.to_string(), value);
        Ok(true)
    }

    fn themes(&self) -> CommandResult<Vec<Theme>> {
        Ok(self.lock()?.themes.clone())
    }

    fn nav_menus(&self) -> CommandResult<Vec<NavMenu>> {
        Ok(self.lock()?.menus.clone())
    }

    fn comments(&self, query: &CommentQuery) -> CommandResult<Vec<Comment>> {
        let data = self.lock()?;
        let wanted = query.status.as_deref().map(normalize_comment_status);
        let comments = data
            .comments
            .iter()
            .filter(|c| match wanted {
                None | Some("all") => c.status != "trash" && c.status != "spam",
                Some(status) => c.status == status,
            })
            .filter(|c| query.post_id.is_none_or(|id| c.post_id == id))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(comments)
    }

    fn core_version(&self) -> CommandResult<CoreVersion> {
        Ok(self.lock()?.core.clone().unwrap_or_else(|| CoreVersion {
            wordpress: "6.6.2".to_string(),
            database: 57155,
            tinymce: "4.9110-20201012".to_string(),
            locale: "en_US".to_string(),
        }))
    }

    fn db_tables(&self) -> CommandResult<Vec<DbTable>> {
        Ok(self.lock()?.tables.clone())
    }

    fn db_prefix(&self) -> String {
        self.lock()
            .ok()
            .and_then(|data| data.db_prefix.clone())
            .unwrap_or_else(|| "wp_".to_string())
    }

    fn php_runtime(&self) -> PhpRuntime {
        self.lock()
            .ok()
            .and_then(|data| data.php.clone())
            .unwrap_or_default()
    }
}

impl ActivityLog for InMemorySite {
    fn logs(&self, query: &LogQuery) -> CommandResult<Vec<ActivityEntry>> {
        let data = self.lock()?;
        let mut entries: Vec<ActivityEntry> = data
            .activity
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(query.limit.unwrap_or(usize::MAX));
        Ok(entries)
    }
}

/// WP-CLI accepts `approve`/`hold`; the stored form is `approved`/`hold`.
fn normalize_comment_status(status: &str) -> &str {
    match status {
        "approve" | "approved" | "1" => "approved",
        "hold" | "unapproved" | "0" => "hold",
        other => other,
    }
}

fn sample_data() -> SiteData {
    let now = Utc::now();
    let plugin = |file: &str, name: &str, version: &str, active: bool, update: Option<&str>| {
        Plugin {
            file: file.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            active,
            update_version: update.map(str::to_string),
            description: String::new(),
            author: String::new(),
        }
    };
    let plugins = vec![
        plugin(
            "akismet/akismet.php",
            "Akismet Anti-spam: Spam Protection",
            "5.3.3",
            true,
            Some("5.3.5"),
        ),
        plugin("hello.php", "Hello Dolly", "1.7.2", false, None),
        plugin("memberpress/memberpress.php", "MemberPress", "1.11.34", true, None),
        plugin("wordpress-seo/wp-seo.php", "Yoast SEO", "23.5", false, None),
    ];

    let user = |id: u64, login: &str, name: &str, role: &str| User {
        id,
        login: login.to_string(),
        display_name: name.to_string(),
        email: format!("{login}@example.test"),
        roles: vec![role.to_string()],
        registered: "2024-01-15 09:30:00".to_string(),
    };
    let users = vec![
        user(1, "admin", "Site Admin", "administrator"),
        user(2, "editor", "Eddie Editor", "editor"),
        user(3, "jane", "Jane Member", "subscriber"),
    ];

    let post = |id: u64, title: &str, post_type: &str, status: &str| Post {
        id,
        title: title.to_string(),
        post_type: post_type.to_string(),
        status: status.to_string(),
        date: "2026-09-01 12:00:00".to_string(),
        author: 1,
    };
    let posts = vec![
        post(1, "Hello world!", "post", "publish"),
        post(5, "Welcome to the membership", "post", "publish"),
        post(7, "Upcoming features", "post", "draft"),
        post(2, "Sample Page", "page", "publish"),
    ];

    let themes = vec![
        Theme {
            stylesheet: "twentytwentyfour".to_string(),
            name: "Twenty Twenty-Four".to_string(),
            version: "1.2".to_string(),
            active: true,
            parent: None,
            update_version: None,
        },
        Theme {
            stylesheet: "twentytwentythree".to_string(),
            name: "Twenty Twenty-Three".to_string(),
            version: "1.5".to_string(),
            active: false,
            parent: None,
            update_version: None,
        },
    ];

    let menus = vec![
        NavMenu {
            term_id: 3,
            name: "Main Menu".to_string(),
            slug: "main-menu".to_string(),
            locations: vec!["primary".to_string()],
            count: 5,
        },
        NavMenu {
            term_id: 4,
            name: "Footer".to_string(),
            slug: "footer".to_string(),
            locations: Vec::new(),
            count: 2,
        },
    ];

    let comment = |id: u64, post_id: u64, author: &str, status: &str| Comment {
        id,
        post_id,
        author: author.to_string(),
        date: "2026-09-02 08:15:00".to_string(),
        status: status.to_string(),
        content: "Great post!".to_string(),
    };
    let comments = vec![
        comment(1, 1, "A WordPress Commenter", "approved"),
        comment(2, 5, "Jane Member", "approved"),
        comment(3, 5, "Spammy McSpam", "spam"),
        comment(4, 1, "Curious Visitor", "hold"),
    ];

    let mut options = BTreeMap::new();
    options.insert("siteurl".to_string(), json!("https://example.test"));
    options.insert("home".to_string(), json!("https://example.test"));
    options.insert("blogname".to_string(), json!("Example Membership Site"));
    options.insert("blogdescription".to_string(), json!("Just another WordPress site"));
    options.insert("admin_email".to_string(), json!("admin@example.test"));
    options.insert("timezone_string".to_string(), json!("UTC"));
    options.insert(
        "active_plugins".to_string(),
        json!(["akismet/akismet.php", "memberpress/memberpress.php"]),
    );

    let table = |name: &str, rows: u64, size_bytes: u64| DbTable {
        name: name.to_string(),
        rows,
        size_bytes,
        status: "OK".to_string(),
    };
    let tables = vec![
        table("wp_comments", 4, 98_304),
        table("wp_options", 152, 1_589_248),
        table("wp_posts", 4, 163_840),
        table("wp_users", 3, 65_536),
    ];

    let php = PhpRuntime {
        version: "8.2.12".to_string(),
        os: "Linux".to_string(),
        sapi: "fpm-fcgi".to_string(),
        memory_limit: "256M".to_string(),
        max_execution_time: 30,
        upload_max_filesize: "64M".to_string(),
        post_max_size: "64M".to_string(),
        max_input_vars: 1000,
        extensions: [
            "Core", "date", "libxml", "openssl", "pcre", "sqlite3", "zlib", "ctype", "curl",
            "dom", "fileinfo", "filter", "ftp", "hash", "iconv", "json", "mbstring", "mysqli",
            "zip",
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect(),
    };

    let activity = |name: &str, slug: &str, action: &str, days_ago: i64| ActivityEntry {
        plugin_name: name.to_string(),
        plugin_slug: slug.to_string(),
        action: action.to_string(),
        version: None,
        user: Some("admin".to_string()),
        timestamp: now - Duration::days(days_ago),
    };
    let activity = vec![
        activity("MemberPress", "memberpress", "activated", 2),
        activity("Yoast SEO", "wordpress-seo", "deactivated", 5),
        activity("Akismet Anti-spam: Spam Protection", "akismet", "updated", 12),
        activity("Yoast SEO", "wordpress-seo", "installed", 45),
    ];

    SiteData {
        core: None,
        php: Some(php),
        db_prefix: None,
        plugins,
        users,
        posts,
        themes,
        menus,
        comments,
        options,
        tables,
        activity,
    }
}
