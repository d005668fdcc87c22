//! Tool abstractions shared by every provenance.
//!
//! A [`Tool`] is anything exposing a name, a description and an invocable
//! entry point. Local modules and remote registries both produce tools; the
//! resolution pipeline wraps each one in a [`ToolHandle`].

mod command;
mod definition;
mod handle;

pub use command::{CommandSpec, CommandTool};
pub use definition::ToolDefinition;
pub use handle::{ToolHandle, ToolSet};

use async_trait::async_trait;
use serde_json::Value;

/// The minimal capability set of a resolved tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared tool name
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value {
        ToolDefinition::empty_schema()
    }

    /// Invoke the tool with structured arguments
    async fn invoke(&self, input: Value) -> Result<Value, ToolError>;
}

/// Errors that can occur while invoking a resolved tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input for '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },

    #[error("Tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },

    #[error("Transport error invoking '{tool}': {message}")]
    Transport { tool: String, message: String },

    #[error("IO error during {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Failures the caller may reasonably retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }
}
