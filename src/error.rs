//! Error types shared by the command pipeline.

use thiserror::Error;

/// Errors raised inside the command pipeline.
///
/// Public entry points never return these directly; they are folded into an
/// [`ExecutionResult`](crate::commands::ExecutionResult) at the component boundary.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to compile rule '{rule}' in table '{table}': {source}")]
    InvalidPattern {
        table: &'static str,
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to spawn process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    #[error("{what} not found: {name}")]
    NotFound { what: &'static str, name: String },

    #[error("Site API error: {message}")]
    Site { message: String },

    #[error("{message}")]
    Unavailable { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CommandError {
    #[must_use]
    pub fn invalid_command(msg: impl Into<String>) -> Self {
        Self::InvalidCommand {
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn site(msg: impl Into<String>) -> Self {
        Self::Site {
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable {
            message: msg.into(),
        }
    }

    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommandError::not_found("Plugin", "akismet");
        assert_eq!(err.to_string(), "Plugin not found: akismet");

        let err = CommandError::invalid_command("unbalanced quotes");
        assert_eq!(err.to_string(), "Invalid command: unbalanced quotes");
    }
}
