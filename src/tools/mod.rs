//! Agent-facing tools over the command pipeline.
//!
//! This module provides:
//! - `spec`: the `ToolSpec` trait and its result, error and context types
//! - `registry`: `ToolRegistry` and its builder
//! - `wp`: the `wp_cli` and `site_query` tools

pub mod registry;
pub mod spec;
pub mod wp;

pub use registry::{ToolDefinition, ToolRegistry, ToolRegistryBuilder};
pub use spec::{ApprovalLevel, ToolCapability, ToolContext, ToolError, ToolResult, ToolSpec};
pub use wp::{SiteQueryTool, WpCliTool};
