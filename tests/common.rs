//! Test utilities shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use wpai_commands::commands::ExecutorSettings;
use wpai_commands::process::{ProcessOutput, ProcessRunner};
use wpai_commands::site::{InMemorySite, WordPress};
use wpai_commands::{CommandHandler, CommandResult};

/// A process runner that answers from a script instead of spawning.
///
/// The first reply whose key is a substring of the space-joined argv wins;
/// anything unscripted exits 127.
pub struct ScriptedRunner {
    available: bool,
    replies: Vec<(String, ProcessOutput)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            available: true,
            replies: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A runner whose probe says processes cannot be spawned.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn reply(mut self, key: &str, stdout: &str, exit_code: i32) -> Self {
        self.replies.push((
            key.to_string(),
            ProcessOutput {
                stdout: stdout.to_string(),
                exit_code: Some(exit_code),
                ..ProcessOutput::default()
            },
        ));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn is_available(&self) -> bool {
        self.available
    }

    fn run(&self, argv: &[String], _timeout: Duration) -> CommandResult<ProcessOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        let joined = argv.join(" ");
        let output = self
            .replies
            .iter()
            .find(|(key, _)| joined.contains(key.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ProcessOutput {
                stderr: format!("{}: command not found", argv.get(2).map_or("", String::as_str)),
                exit_code: Some(127),
                ..ProcessOutput::default()
            });
        Ok(output)
    }
}

pub fn sample_site() -> Arc<InMemorySite> {
    Arc::new(InMemorySite::sample())
}

/// Handler over the sample site with the given runner and default settings.
pub fn handler_with(runner: Arc<dyn ProcessRunner>) -> CommandHandler {
    let site = sample_site();
    CommandHandler::builder(site.clone())
        .activity_log(site)
        .runner(runner)
        .settings(ExecutorSettings::default())
        .build()
}

/// Handler that can never spawn a process.
pub fn api_only_handler() -> CommandHandler {
    handler_with(Arc::new(ScriptedRunner::unavailable()))
}

/// What `wp plugin list --format=json` prints for the sample site.
pub fn plugin_list_json(site: &InMemorySite) -> String {
    let rows: Vec<Value> = site
        .plugins()
        .unwrap()
        .iter()
        .map(|p| {
            json!({
                "name": p.slug(),
                "status": p.status(),
                "update": if p.update_available() { "available" } else { "none" },
                "version": p.version,
            })
        })
        .collect();
    Value::Array(rows).to_string()
}

/// Data rows of a TSV table, header excluded.
pub fn data_rows(tsv: &str) -> Vec<Vec<String>> {
    tsv.lines()
        .skip(1)
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}
