//! Command pipeline for an LLM site assistant.
//!
//! A chat message or explicit command flows through
//! `detect → sanitize → vet → route` to one of two executors: PHP or WP-CLI.
//! When processes cannot be spawned, common WP-CLI reads are answered
//! through the [`site::WordPress`] API instead. Every outcome is an
//! [`commands::ExecutionResult`]; nothing panics across the public surface.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod site;
pub mod tools;

pub use commands::{CommandHandler, ExecutionMethod, ExecutionResult, Parameters};
pub use error::{CommandError, CommandResult};
