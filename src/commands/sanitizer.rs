//! Command sanitizer: strips shell metacharacters and normalizes prefixes.

use regex::Regex;
use serde_json::Value;

use crate::error::{CommandError, CommandResult};

use super::result::Parameters;

/// Characters removed from every command and string parameter.
pub const STRIPPED_CHARS: &[char] = &[';', '&', '|', '>', '<', '`', '$'];

/// Sub-commands that get an implicit `wp ` prefix.
const WP_CLI_PREFIX_PATTERN: &str = r"(?i)^(plugin|theme|post|user|option|core|site|db)\s";

/// Sanitizer contract used by the handler.
pub trait Sanitize: Send + Sync {
    fn sanitize(&self, command: &str) -> String;

    fn clean_parameters(&self, parameters: &Parameters) -> Parameters;
}

/// The full sanitizer.
#[derive(Debug, Clone)]
pub struct CommandSanitizer {
    wp_cli_prefix: Regex,
}

impl CommandSanitizer {
    pub fn new() -> CommandResult<Self> {
        let wp_cli_prefix =
            Regex::new(WP_CLI_PREFIX_PATTERN).map_err(|source| CommandError::InvalidPattern {
                table: "sanitizer",
                rule: "wp_cli_prefix",
                source,
            })?;
        Ok(Self { wp_cli_prefix })
    }
}

impl Sanitize for CommandSanitizer {
    fn sanitize(&self, command: &str) -> String {
        let stripped = strip_chars(command.trim());
        let mut cleaned = strip_wrapping_quotes(stripped.trim());

        if !cleaned.starts_with("wp ")
            && !cleaned.starts_with("php ")
            && self.wp_cli_prefix.is_match(&cleaned)
        {
            cleaned = format!("wp {cleaned}");
        }
        cleaned
    }

    fn clean_parameters(&self, parameters: &Parameters) -> Parameters {
        clean_map(parameters)
    }
}

/// Remove every character in [`STRIPPED_CHARS`].
#[must_use]
pub fn strip_chars(input: &str) -> String {
    input.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// Peel matching `"…"` / `'…'` pairs that wrap the whole string.
fn strip_wrapping_quotes(input: &str) -> String {
    let mut current = input;
    loop {
        let wrapped = current.len() >= 2
            && ((current.starts_with('"') && current.ends_with('"'))
                || (current.starts_with('\'') && current.ends_with('\'')));
        if !wrapped {
            return current.to_string();
        }
        current = current[1..current.len() - 1].trim();
    }
}

fn clean_map(parameters: &Parameters) -> Parameters {
    parameters
        .iter()
        .filter_map(|(key, value)| clean_value(value).map(|v| (key.clone(), v)))
        .collect()
}

/// `None` means the value is dropped.
fn clean_value(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let cleaned = strip_chars(s).trim().to_string();
            (!cleaned.is_empty()).then_some(Value::String(cleaned))
        }
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.iter().filter_map(clean_value).collect();
            (!cleaned.is_empty()).then_some(Value::Array(cleaned))
        }
        Value::Object(map) => {
            let cleaned = clean_map(map);
            (!cleaned.is_empty()).then_some(Value::Object(cleaned))
        }
        Value::Bool(_) | Value::Number(_) => Some(value.clone()),
    }
}
