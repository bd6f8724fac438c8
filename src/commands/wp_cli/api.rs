//! Direct-API emulation of WP-CLI sub-commands.
//!
//! Used when processes cannot be spawned or restricted mode is on. Each
//! handler re-implements one WP-CLI command group over [`WordPress`] and
//! renders lists with the same columns WP-CLI's JSON output carries.

use serde_json::{Value, json};

use crate::error::{CommandError, CommandResult};
use crate::site::{CommentQuery, PostQuery, UserQuery, WordPress};

use super::ParsedCommand;
use super::table::{Table, columns_for};
use crate::commands::result::{ExecutionMethod, ExecutionResult};

type GroupHandler = fn(&dyn WordPress, &ParsedCommand) -> CommandResult<ExecutionResult>;

/// Supported command groups, checked in order.
const GROUPS: &[(&str, GroupHandler)] = &[
    ("plugin", plugin),
    ("user", user),
    ("post", post),
    ("option", option),
    ("site", site),
    ("core", core),
    ("theme", theme),
    ("menu", menu),
    ("comment", comment),
    ("db", db),
];

/// Run a parsed command against the site API.
pub(super) fn execute(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    if parsed.group.is_empty() {
        return Ok(unsupported(parsed, "No command specified"));
    }
    let handler = GROUPS
        .iter()
        .find(|(group, _)| *group == parsed.group)
        .map(|(_, handler)| *handler);

    let result = match handler {
        Some(handler) => match handler(site, parsed) {
            Err(CommandError::NotFound { what, name }) => {
                let message = format!("{what} not found: {name}");
                Ok(ExecutionResult::failure(&parsed.raw, &message).with_error(message))
            }
            other => other,
        },
        None => Ok(unsupported(
            parsed,
            &format!("Unsupported command: {}", parsed.group),
        )),
    }?;
    Ok(result.with_method(ExecutionMethod::WpApi))
}

fn unsupported(parsed: &ParsedCommand, message: &str) -> ExecutionResult {
    ExecutionResult::failure(&parsed.raw, message).with_error(message)
}

fn unsupported_sub(parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    let sub = if parsed.sub.is_empty() {
        "(none)"
    } else {
        parsed.sub.as_str()
    };
    Ok(unsupported(
        parsed,
        &format!("Unsupported {} command: {sub}", parsed.group),
    ))
}

fn missing_argument(parsed: &ParsedCommand, what: &str) -> CommandResult<ExecutionResult> {
    let message = format!("Please specify {what}");
    Ok(ExecutionResult::failure(&parsed.raw, &message).with_error(message))
}

/// List result: the TSV table goes into both `output` and `result`.
pub(super) fn list_result(command: &str, group: &str, rows: Vec<Value>) -> ExecutionResult {
    let table = Table::from_rows(&rows, columns_for(group));
    let tsv = table.to_tsv();
    ExecutionResult::success(command, tsv.clone())
        .with_command_type(format!("{group}_list"))
        .with_result(tsv)
        .with_data(Value::Array(rows))
}

/// `FIELD\tVALUE` rendering used by the `get` sub-commands.
fn field_result(command: &str, fields: &[(&str, String)], data: Value) -> ExecutionResult {
    let output = std::iter::once("FIELD\tVALUE".to_string())
        .chain(fields.iter().map(|(field, value)| format!("{field}\t{value}")))
        .collect::<Vec<_>>()
        .join("\n");
    ExecutionResult::success(command, output).with_data(data)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// === plugin ===

fn plugin(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let status = parsed.flag("status");
            let updates_only = parsed.flag("update") == Some("available");
            let rows = site
                .plugins()?
                .iter()
                .filter(|p| status.is_none_or(|s| p.status().eq_ignore_ascii_case(s)))
                .filter(|p| !updates_only || p.update_available())
                .map(|p| {
                    json!({
                        "name": p.slug(),
                        "status": p.status(),
                        "update": if p.update_available() { "available" } else { "none" },
                        "version": p.version,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "plugin", rows))
        }
        "status" => match parsed.arg(0) {
            Some(slug) => plugin_details(site, parsed, slug),
            None => {
                let plugins = site.plugins()?;
                let mut lines = vec![format!("{} installed plugins:", plugins.len())];
                for p in &plugins {
                    let flag = if p.active { "A" } else { "I" };
                    let update = if p.update_available() { "U" } else { " " };
                    lines.push(format!("  {flag}{update} {} {}", p.slug(), p.version));
                }
                lines.push(String::new());
                lines.push("Legend: A = Active, I = Inactive, U = Update Available".to_string());
                Ok(ExecutionResult::success(&parsed.raw, lines.join("\n")))
            }
        },
        "get" => match parsed.arg(0) {
            Some(slug) => plugin_details(site, parsed, slug),
            None => missing_argument(parsed, "a plugin slug"),
        },
        sub @ ("activate" | "deactivate") => {
            let Some(slug) = parsed.arg(0) else {
                return missing_argument(parsed, "a plugin slug");
            };
            let activate = sub == "activate";
            let current = find_plugin(site, slug)?;
            if current.active == activate {
                let state = if activate { "active" } else { "inactive" };
                return Ok(ExecutionResult::success(
                    &parsed.raw,
                    format!("Warning: Plugin '{slug}' is already {state}."),
                ));
            }
            let updated = site.set_plugin_active(slug, activate)?;
            Ok(ExecutionResult::success(
                &parsed.raw,
                format!("Plugin '{}' {sub}d.\nSuccess: {}d 1 of 1 plugins.", updated.slug(), capitalize(sub)),
            ))
        }
        _ => unsupported_sub(parsed),
    }
}

fn find_plugin(site: &dyn WordPress, slug: &str) -> CommandResult<crate::site::Plugin> {
    site.plugins()?
        .into_iter()
        .find(|p| p.slug().eq_ignore_ascii_case(slug))
        .ok_or_else(|| CommandError::not_found("Plugin", slug))
}

fn plugin_details(
    site: &dyn WordPress,
    parsed: &ParsedCommand,
    slug: &str,
) -> CommandResult<ExecutionResult> {
    let p = find_plugin(site, slug)?;
    let fields = [
        ("name", p.slug().to_string()),
        ("title", p.name.clone()),
        ("status", p.status().to_string()),
        ("version", p.version.clone()),
        (
            "update",
            p.update_version.clone().unwrap_or_else(|| "none".to_string()),
        ),
        ("author", p.author.clone()),
        ("description", p.description.clone()),
    ];
    Ok(field_result(&parsed.raw, &fields, json!(p)))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// === user ===

fn user(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let query = UserQuery {
                role: parsed.flag("role").map(str::to_string),
                limit: parsed.flag_usize("number"),
            };
            let rows = site
                .users(&query)?
                .iter()
                .map(|u| {
                    json!({
                        "ID": u.id,
                        "user_login": u.login,
                        "display_name": u.display_name,
                        "user_email": u.email,
                        "user_registered": u.registered,
                        "roles": u.roles.join(","),
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "user", rows))
        }
        "get" => {
            let Some(key) = parsed.arg(0) else {
                return missing_argument(parsed, "a user ID or login");
            };
            let user = site
                .users(&UserQuery::default())?
                .into_iter()
                .find(|u| u.id.to_string() == key || u.login.eq_ignore_ascii_case(key))
                .ok_or_else(|| CommandError::not_found("User", key))?;
            let fields = [
                ("ID", user.id.to_string()),
                ("user_login", user.login.clone()),
                ("display_name", user.display_name.clone()),
                ("user_email", user.email.clone()),
                ("user_registered", user.registered.clone()),
                ("roles", user.roles.join(", ")),
            ];
            Ok(field_result(&parsed.raw, &fields, json!(user)))
        }
        _ => unsupported_sub(parsed),
    }
}

// === post ===

fn post(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let query = PostQuery {
                post_type: parsed.flag("post_type").unwrap_or("post").to_string(),
                status: parsed.flag("post_status").map(str::to_string),
                limit: parsed.flag_usize("posts_per_page"),
            };
            let rows = site
                .posts(&query)?
                .iter()
                .map(|p| {
                    json!({
                        "ID": p.id,
                        "post_title": p.title,
                        "post_type": p.post_type,
                        "post_date": p.date,
                        "post_status": p.status,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "post", rows))
        }
        "get" => {
            let Some(id) = parsed.arg(0) else {
                return missing_argument(parsed, "a post ID");
            };
            let post = ["post", "page"]
                .iter()
                .map(|post_type| {
                    site.posts(&PostQuery {
                        post_type: (*post_type).to_string(),
                        ..PostQuery::default()
                    })
                })
                .collect::<CommandResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .find(|p| p.id.to_string() == id)
                .ok_or_else(|| CommandError::not_found("Post", id))?;
            let fields = [
                ("ID", post.id.to_string()),
                ("post_title", post.title.clone()),
                ("post_type", post.post_type.clone()),
                ("post_status", post.status.clone()),
                ("post_date", post.date.clone()),
                ("post_author", post.author.to_string()),
            ];
            Ok(field_result(&parsed.raw, &fields, json!(post)))
        }
        _ => unsupported_sub(parsed),
    }
}

// === option ===

fn option(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "get" => {
            let Some(name) = parsed.arg(0) else {
                return missing_argument(parsed, "an option name");
            };
            match site.option(name)? {
                Some(value) => {
                    Ok(ExecutionResult::success(&parsed.raw, value_text(&value)).with_data(value))
                }
                None => {
                    let message = format!("Could not get '{name}' option. Does it exist?");
                    Ok(ExecutionResult::failure(&parsed.raw, &message).with_error(message))
                }
            }
        }
        "list" => {
            let needle = parsed
                .flag("search")
                .map(|s| s.trim_matches('*').to_lowercase());
            let rows = site
                .options()?
                .into_iter()
                .filter(|(name, _)| {
                    needle
                        .as_ref()
                        .is_none_or(|needle| name.to_lowercase().contains(needle))
                })
                .map(|(name, value)| {
                    json!({
                        "option_name": name,
                        "option_value": value_text(&value),
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "option", rows))
        }
        "update" => {
            let (Some(name), Some(raw_value)) = (parsed.arg(0), parsed.arg(1)) else {
                return missing_argument(parsed, "an option name and value");
            };
            let value = if parsed.flag("format") == Some("json") {
                serde_json::from_str(raw_value)
                    .map_err(|e| CommandError::invalid_command(format!("invalid JSON value: {e}")))?
            } else {
                Value::String(raw_value.to_string())
            };
            let output = if site.update_option(name, value)? {
                format!("Success: Updated '{name}' option.")
            } else {
                format!("Success: Value passed for '{name}' option is unchanged.")
            };
            Ok(ExecutionResult::success(&parsed.raw, output))
        }
        _ => unsupported_sub(parsed),
    }
}

// === site ===

fn site(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    let option_text = |name: &str| -> CommandResult<String> {
        Ok(site.option(name)?.map(|v| value_text(&v)).unwrap_or_default())
    };
    match parsed.sub.as_str() {
        "url" => Ok(ExecutionResult::success(&parsed.raw, option_text("siteurl")?)),
        "info" => {
            let core = site.core_version()?;
            let fields = [
                ("Site URL", option_text("siteurl")?),
                ("Home URL", option_text("home")?),
                ("Site Title", option_text("blogname")?),
                ("Tagline", option_text("blogdescription")?),
                ("Admin Email", option_text("admin_email")?),
                ("Timezone", option_text("timezone_string")?),
                ("WordPress Version", core.wordpress.clone()),
                ("Language", core.locale.clone()),
            ];
            let output = fields
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect::<Vec<_>>()
                .join("\n");
            let data: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(label, value)| ((*label).to_string(), Value::String(value.clone())))
                .collect();
            Ok(ExecutionResult::success(&parsed.raw, output).with_data(Value::Object(data)))
        }
        _ => unsupported_sub(parsed),
    }
}

// === core ===

fn core(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "version" => {
            let core = site.core_version()?;
            let output = if parsed.has_flag("extra") {
                format!(
                    "WordPress version:\t{}\nDatabase revision:\t{}\nTinyMCE version:\t{}\nPackage language:\t{}",
                    core.wordpress, core.database, core.tinymce, core.locale
                )
            } else {
                core.wordpress.clone()
            };
            Ok(ExecutionResult::success(&parsed.raw, output).with_data(json!(core)))
        }
        "is-installed" => Ok(ExecutionResult::success(&parsed.raw, "WordPress is installed.")
            .with_return_code(Some(0))),
        _ => unsupported_sub(parsed),
    }
}

// === theme ===

fn theme(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let status = parsed.flag("status");
            let rows = site
                .themes()?
                .iter()
                .filter(|t| status.is_none_or(|s| t.status().eq_ignore_ascii_case(s)))
                .map(|t| {
                    json!({
                        "name": t.stylesheet,
                        "status": t.status(),
                        "update": if t.update_version.is_some() { "available" } else { "none" },
                        "version": t.version,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "theme", rows))
        }
        "status" => {
            let themes = site.themes()?;
            let mut lines = vec![format!("{} installed themes:", themes.len())];
            for t in &themes {
                let flag = if t.active { "A" } else { "I" };
                lines.push(format!("  {flag} {} {}", t.stylesheet, t.version));
            }
            lines.push(String::new());
            lines.push("Legend: A = Active, I = Inactive".to_string());
            Ok(ExecutionResult::success(&parsed.raw, lines.join("\n")))
        }
        "get" => {
            let Some(slug) = parsed.arg(0) else {
                return missing_argument(parsed, "a theme slug");
            };
            let theme = site
                .themes()?
                .into_iter()
                .find(|t| t.stylesheet.eq_ignore_ascii_case(slug))
                .ok_or_else(|| CommandError::not_found("Theme", slug))?;
            let fields = [
                ("name", theme.stylesheet.clone()),
                ("title", theme.name.clone()),
                ("version", theme.version.clone()),
                ("status", theme.status().to_string()),
                ("parent_theme", theme.parent.clone().unwrap_or_default()),
            ];
            Ok(field_result(&parsed.raw, &fields, json!(theme)))
        }
        _ => unsupported_sub(parsed),
    }
}

// === menu ===

fn menu(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let rows = site
                .nav_menus()?
                .iter()
                .map(|m| {
                    json!({
                        "term_id": m.term_id,
                        "name": m.name,
                        "slug": m.slug,
                        "locations": m.locations.join(","),
                        "count": m.count,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "menu", rows))
        }
        _ => unsupported_sub(parsed),
    }
}

// === comment ===

fn comment(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "list" => {
            let query = CommentQuery {
                status: parsed.flag("status").map(str::to_string),
                post_id: parsed.flag("post_id").and_then(|id| id.parse().ok()),
                limit: parsed.flag_usize("number"),
            };
            let rows = site
                .comments(&query)?
                .iter()
                .map(|c| {
                    json!({
                        "comment_ID": c.id,
                        "comment_post_ID": c.post_id,
                        "comment_date": c.date,
                        "comment_approved": c.status,
                        "comment_author": c.author,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "comment", rows))
        }
        "count" => {
            let count = |status: &str| -> CommandResult<usize> {
                Ok(site
                    .comments(&CommentQuery {
                        status: Some(status.to_string()),
                        ..CommentQuery::default()
                    })?
                    .len())
            };
            let approved = count("approved")?;
            let moderated = count("hold")?;
            let spam = count("spam")?;
            let trash = count("trash")?;
            let total = approved + moderated + spam + trash;
            let output = format!(
                "approved:\t{approved}\nmoderated:\t{moderated}\nspam:\t{spam}\ntrash:\t{trash}\ntotal_comments:\t{total}"
            );
            Ok(ExecutionResult::success(&parsed.raw, output).with_data(json!({
                "approved": approved,
                "moderated": moderated,
                "spam": spam,
                "trash": trash,
                "total_comments": total,
            })))
        }
        _ => unsupported_sub(parsed),
    }
}

// === db ===

fn db(site: &dyn WordPress, parsed: &ParsedCommand) -> CommandResult<ExecutionResult> {
    match parsed.sub.as_str() {
        "size" => {
            let tables = site.db_tables()?;
            let bytes: u64 = tables.iter().map(|t| t.size_bytes).sum();
            Ok(ExecutionResult::success(
                &parsed.raw,
                format!(
                    "Database size: {} ({} tables)",
                    human_size(bytes),
                    tables.len()
                ),
            )
            .with_data(json!({"size_bytes": bytes, "tables": tables.len()})))
        }
        "tables" => {
            let rows = site
                .db_tables()?
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "rows": t.rows,
                        "size": human_size(t.size_bytes),
                        "status": t.status,
                    })
                })
                .collect();
            Ok(list_result(&parsed.raw, "db", rows))
        }
        "check" => {
            let tables = site.db_tables()?;
            let mut lines: Vec<String> = tables
                .iter()
                .map(|t| format!("{}\t{}", t.name, t.status))
                .collect();
            let failing = tables
                .iter()
                .filter(|t| !t.status.eq_ignore_ascii_case("OK"))
                .count();
            if failing == 0 {
                lines.push("Success: Database checked.".to_string());
                Ok(ExecutionResult::success(&parsed.raw, lines.join("\n")))
            } else {
                let message = format!("{failing} table(s) reported problems");
                lines.push(format!("Error: {message}"));
                Ok(ExecutionResult::failure(&parsed.raw, lines.join("\n")).with_error(message))
            }
        }
        "prefix" => Ok(ExecutionResult::success(&parsed.raw, site.db_prefix())),
        _ => unsupported_sub(parsed),
    }
}

/// Sizes in the units `wp db size --human-readable` uses.
fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::InMemorySite;
    use pretty_assertions::assert_eq;

    fn run(command: &str) -> ExecutionResult {
        let site = InMemorySite::sample();
        execute(&site, &ParsedCommand::parse(command)).expect("api")
    }

    #[test]
    fn test_plugin_list_table() {
        let result = run("wp plugin list");
        assert!(result.success);
        assert_eq!(result.method, Some(ExecutionMethod::WpApi));
        assert_eq!(result.command_type.as_deref(), Some("plugin_list"));
        let table = result.result.expect("table");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "NAME\tSTATUS\tUPDATE\tVERSION");
        assert_eq!(lines[1], "akismet\tactive\tavailable\t5.3.3");
        assert_eq!(lines.len(), 5);
        assert_eq!(result.output, table);
    }

    #[test]
    fn test_plugin_list_filters() {
        let active = run("wp plugin list --status=active").result.expect("table");
        assert_eq!(active.lines().count(), 3);
        assert!(active.lines().skip(1).all(|line| line.contains("\tactive\t")));

        let updates = run("wp plugin list --update=available").result.expect("table");
        assert_eq!(updates.lines().count(), 2);
    }

    #[test]
    fn test_plugin_status_and_get() {
        let all = run("wp plugin status");
        assert!(all.output.starts_with("4 installed plugins:"));
        assert!(all.output.contains("AU akismet 5.3.3"));

        let one = run("wp plugin get memberpress");
        assert!(one.output.contains("title\tMemberPress"));

        let missing = run("wp plugin get nope");
        assert!(!missing.success);
        assert_eq!(missing.output, "Plugin not found: nope");
    }

    #[test]
    fn test_plugin_activation_round_trip() {
        let site = InMemorySite::sample();
        let result = execute(&site, &ParsedCommand::parse("wp plugin activate hello")).expect("api");
        assert!(result.success);
        assert!(result.output.contains("Plugin 'hello' activated."));

        let again = execute(&site, &ParsedCommand::parse("wp plugin activate hello")).expect("api");
        assert!(again.output.contains("already active"));
    }

    #[test]
    fn test_user_and_post_lists() {
        let users = run("wp user list --role=administrator");
        assert_eq!(users.command_type.as_deref(), Some("user_list"));
        let table = users.result.expect("table");
        assert!(table.starts_with("ID\tUSER_LOGIN\tDISPLAY_NAME"));
        assert_eq!(table.lines().count(), 2);

        let pages = run("wp post list --post_type=page");
        assert_eq!(pages.result.expect("table").lines().count(), 2);

        let drafts = run("wp post list --post_status=draft");
        assert!(drafts.output.contains("Upcoming features"));

        assert!(run("wp post get 2").output.contains("Sample Page"));
        assert!(run("wp user get jane").output.contains("subscriber"));
    }

    #[test]
    fn test_option_commands() {
        assert_eq!(run("wp option get blogname").output, "Example Membership Site");
        let missing = run("wp option get nothing_here");
        assert!(!missing.success);
        assert!(missing.output.contains("Does it exist?"));

        let listed = run("wp option list --search=blog*");
        assert_eq!(listed.result.expect("table").lines().count(), 3);

        let updated = run("wp option update blogdescription 'A new tagline'");
        assert_eq!(updated.output, "Success: Updated 'blogdescription' option.");
    }

    #[test]
    fn test_core_site_and_db() {
        assert_eq!(run("wp core version").output, "6.6.2");
        assert!(run("wp core version --extra").output.contains("Database revision:\t57155"));
        assert_eq!(run("wp site url").output, "https://example.test");
        assert!(run("wp site info").output.contains("Site Title: Example Membership Site"));
        assert!(run("wp db size").output.starts_with("Database size: 1.83 MB (4 tables)"));
        assert_eq!(run("wp db tables").command_type.as_deref(), Some("db_list"));
        assert!(run("wp db check").output.ends_with("Success: Database checked."));
        assert_eq!(run("wp db prefix").output, "wp_");
    }

    #[test]
    fn test_theme_menu_comment() {
        let active = run("wp theme list --status=active").result.expect("table");
        assert_eq!(active.lines().nth(1), Some("twentytwentyfour\tactive\tnone\t1.2"));
        assert_eq!(run("wp menu list").command_type.as_deref(), Some("menu_list"));
        let comments = run("wp comment list --status=approve");
        assert_eq!(comments.result.expect("table").lines().count(), 3);
        assert!(run("wp comment count").output.contains("total_comments:\t4"));
    }

    #[test]
    fn test_unsupported_commands_never_crash() {
        let sub = run("wp plugin install akismet");
        assert!(!sub.success);
        assert_eq!(sub.output, "Unsupported plugin command: install");

        let group = run("wp cron event list");
        assert!(!group.success);
        assert_eq!(group.output, "Unsupported command: cron");

        let empty = run("wp");
        assert!(!empty.success);

        assert!(!run("wp plugin get").success);
    }
}
