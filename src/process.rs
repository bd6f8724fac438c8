//! Process execution primitive used by the PHP and WP-CLI executors.
//!
//! Provides:
//! - Runtime probing of whether process spawning is usable
//! - Synchronous execution with a wall-clock guard on top of `timeout(1)`
//! - Captured stdout/stderr and exit code

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use wait_timeout::ChildExt;

use crate::error::{CommandError, CommandResult};

/// Maximum captured output before truncation.
const MAX_OUTPUT_SIZE: usize = 30_000;

/// Extra time granted past the `timeout(1)` limit before the child is killed here.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    pub duration_ms: u64,
}

impl ProcessOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    /// Output lines with stderr appended after stdout, like `exec($cmd . ' 2>&1')`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::to_string)
            .collect()
    }
}

/// Something that can run an argv with a timeout.
pub trait ProcessRunner: Send + Sync {
    /// Whether spawning processes works in this environment.
    fn is_available(&self) -> bool;

    fn run(&self, argv: &[String], timeout: Duration) -> CommandResult<ProcessOutput>;
}

/// Runs commands with `std::process::Command`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    enabled: bool,
    working_dir: Option<PathBuf>,
}

impl SystemRunner {
    #[must_use]
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self {
            enabled: true,
            working_dir,
        }
    }

    /// A runner that always reports itself unavailable.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            working_dir: None,
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProcessRunner for SystemRunner {
    fn is_available(&self) -> bool {
        self.enabled && find_in_path("timeout").is_some()
    }

    fn run(&self, argv: &[String], timeout: Duration) -> CommandResult<ProcessOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CommandError::invalid_command("empty argument list"))?;
        if !self.enabled {
            return Err(CommandError::unavailable("process execution is disabled"));
        }

        let started = Instant::now();
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_thread = std::thread::spawn(move || read_all(stdout_handle));
        let stderr_thread = std::thread::spawn(move || read_all(stderr_handle));

        let (exit_code, timed_out) = match child.wait_timeout(timeout + KILL_GRACE)? {
            Some(status) => (status.code(), false),
            None => {
                let _ = child.kill();
                let status = child.wait().ok();
                (status.and_then(|s| s.code()), true)
            }
        };

        let stdout = stdout_thread.join().unwrap_or_default();
        let stderr = stderr_thread.join().unwrap_or_default();

        Ok(ProcessOutput {
            stdout: truncate_output(&String::from_utf8_lossy(&stdout)),
            stderr: truncate_output(&String::from_utf8_lossy(&stderr)),
            // timeout(1) reports an expired limit with status 124
            timed_out: timed_out || exit_code == Some(124),
            exit_code,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

fn read_all<R: Read>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = handle {
        let _ = reader.read_to_end(&mut buf);
    }
    buf
}

/// Locate an executable on `PATH`.
#[must_use]
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|path| path.is_file())
}

/// Prefix an argv with `timeout <secs>s`.
#[must_use]
pub fn with_timeout(secs: u64, program: &str, args: Vec<String>) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 3);
    argv.push("timeout".to_string());
    argv.push(format!("{secs}s"));
    argv.push(program.to_string());
    argv.extend(args);
    argv
}

fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut end = MAX_OUTPUT_SIZE;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}...\n\n[Output truncated at {} characters. {} characters omitted.]",
        &output[..end],
        end,
        output.len() - end
    )
}

/// Records every argv and replies with a canned output.
#[cfg(test)]
pub(crate) struct FakeRunner {
    pub available: bool,
    pub output: ProcessOutput,
    pub calls: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
impl FakeRunner {
    pub fn replying(stdout: &str, exit_code: i32) -> Self {
        Self {
            available: true,
            output: ProcessOutput {
                stdout: stdout.to_string(),
                exit_code: Some(exit_code),
                ..ProcessOutput::default()
            },
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::replying("", 0)
        }
    }

    pub fn last_call(&self) -> Option<Vec<String>> {
        self.calls.lock().ok()?.last().cloned()
    }
}

#[cfg(test)]
impl ProcessRunner for FakeRunner {
    fn is_available(&self) -> bool {
        self.available
    }

    fn run(&self, argv: &[String], _timeout: Duration) -> CommandResult<ProcessOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(argv.to_vec());
        }
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_timeout_builds_argv() {
        let argv = with_timeout(10, "php", vec!["-m".to_string()]);
        assert_eq!(argv, vec!["timeout", "10s", "php", "-m"]);
    }

    #[test]
    fn test_disabled_runner_is_unavailable() {
        let runner = SystemRunner::disabled();
        assert!(!runner.is_available());
        let err = runner
            .run(&["echo".to_string()], Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_empty_argv_rejected() {
        let runner = SystemRunner::default();
        assert!(runner.run(&[], Duration::from_secs(1)).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_execution_captures_output() {
        let runner = SystemRunner::default();
        let output = runner
            .run(
                &["sh".to_string(), "-c".to_string(), "echo hello; exit 3".to_string()],
                Duration::from_secs(5),
            )
            .expect("run");
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.lines(), vec!["hello".to_string()]);
        assert!(!output.success());
    }

    #[test]
    fn test_output_truncation() {
        let long_output = "x".repeat(50_000);
        let truncated = truncate_output(&long_output);

        assert!(truncated.len() < long_output.len());
        assert!(truncated.contains("truncated"));
    }
}
