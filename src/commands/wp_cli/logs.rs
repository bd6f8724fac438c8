//! Plugin activity report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::CommandResult;
use crate::site::{ActivityEntry, ActivityLog, LogQuery, window_start};

use super::ParsedCommand;
use crate::commands::ExecutorSettings;
use crate::commands::result::{ExecutionMethod, ExecutionResult, Parameters, param_str, param_u64};

/// Widest window a report covers, roughly ten years.
pub(super) const MAX_LOG_DAYS: u32 = 3650;

/// Filters for one report. Caller parameters win over `--flag=value` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct LogRequest {
    pub days: u32,
    pub limit: usize,
    pub action: Option<String>,
    pub plugin: Option<String>,
}

impl LogRequest {
    pub(super) fn resolve(
        parsed: &ParsedCommand,
        parameters: &Parameters,
        settings: &ExecutorSettings,
    ) -> Self {
        let days = param_u64(parameters, "days")
            .or_else(|| parsed.flag("days").and_then(|d| d.parse().ok()))
            .and_then(|d| u32::try_from(d).ok())
            .filter(|d| *d > 0)
            .unwrap_or(settings.log_days)
            .min(MAX_LOG_DAYS);
        let limit = param_u64(parameters, "limit")
            .or_else(|| parsed.flag("limit").and_then(|l| l.parse().ok()))
            .and_then(|l| usize::try_from(l).ok())
            .filter(|l| *l > 0)
            .unwrap_or(settings.log_limit);
        let action = param_str(parameters, "action").or_else(|| parsed.flag("action").map(str::to_string));
        let plugin = param_str(parameters, "plugin_name")
            .or_else(|| param_str(parameters, "plugin"))
            .or_else(|| parsed.flag("plugin").map(str::to_string));
        Self {
            days,
            limit,
            action,
            plugin,
        }
    }
}

pub(super) fn report(
    log: &dyn ActivityLog,
    command: &str,
    request: &LogRequest,
) -> CommandResult<ExecutionResult> {
    let now = Utc::now();
    let summary = log.activity_summary(request.days)?;
    let entries = log.logs(&LogQuery {
        since: window_start(now, request.days),
        limit: Some(request.limit),
        action: request.action.clone(),
        plugin: request.plugin.clone(),
    })?;

    let output = render(request, summary.total, &summary.actions, &entries, now);
    let data = json!({
        "days": summary.days,
        "total": summary.total,
        "actions": summary.actions,
        "plugins": summary.plugins,
        "logs": entries,
    });

    Ok(ExecutionResult::success(command, output)
        .with_method(ExecutionMethod::WpApi)
        .with_command_type("plugin_logs")
        .with_data(data))
}

fn render(
    request: &LogRequest,
    total: usize,
    actions: &BTreeMap<String, usize>,
    entries: &[ActivityEntry],
    now: DateTime<Utc>,
) -> String {
    let days = request.days;
    if total == 0 {
        return format!("No plugin activity found in the last {days} days.");
    }

    let mut lines = vec![format!(
        "Plugin activity in the last {days} days: {total} event{}",
        plural(total)
    )];
    let counts: Vec<String> = actions
        .iter()
        .map(|(action, count)| format!("{action} ({count})"))
        .collect();
    lines.push(format!("Actions: {}", counts.join(", ")));
    lines.push(String::new());

    if entries.is_empty() {
        lines.push("No entries match the requested filters.".to_string());
    } else {
        lines.push("Recent activity:".to_string());
        for entry in entries {
            let mut line = format!("- {} {}", entry.plugin_name, entry.action);
            if let Some(version) = &entry.version {
                line.push_str(&format!(" (v{version})"));
            }
            if let Some(user) = &entry.user {
                line.push_str(&format!(" by {user}"));
            }
            line.push_str(&format!(", {}", relative_time(entry.timestamp, now)));
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// "N units ago", coarsest unit first.
#[must_use]
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let (n, unit) = match secs {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    let suffix = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{suffix} ago")
}
