//! Command-backed tools.
//!
//! Each invocation runs the tool's command in its own process: JSON arguments
//! go in on stdin, the result comes back on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Tool, ToolDefinition, ToolError};

/// Default cap on plain-text output and error detail
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100_000;

/// How to launch a command tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Program and arguments, executed directly
    Argv(Vec<String>),
    /// Shell command line, executed with `sh -c`
    Shell(String),
}

impl CommandSpec {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Argv(argv) => argv.first().is_none_or(|program| program.trim().is_empty()),
            Self::Shell(line) => line.trim().is_empty(),
        }
    }

    fn to_command(&self, cwd: &Path) -> Option<Command> {
        let mut command = match self {
            Self::Argv(argv) => {
                let (program, args) = argv.split_first()?;
                let mut command = Command::new(program);
                command.args(args);
                command
            }
            Self::Shell(line) => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                command
            }
        };
        command.current_dir(cwd);
        Some(command)
    }
}

/// A tool implemented by an external command
#[derive(Debug, Clone)]
pub struct CommandTool {
    definition: ToolDefinition,
    command: CommandSpec,
    working_dir: PathBuf,
    timeout_ms: u64,
    max_output_bytes: usize,
}

impl CommandTool {
    pub fn new(definition: ToolDefinition, command: CommandSpec, working_dir: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            definition,
            command,
            working_dir: working_dir.into(),
            timeout_ms,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Set maximum captured output size in bytes
    pub fn with_max_output(mut self, max_bytes: usize) -> Self {
        self.max_output_bytes = max_bytes;
        self
    }

    pub fn command(&self) -> &CommandSpec {
        &self.command
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn truncate(&self, mut output: String) -> String {
        if output.len() > self.max_output_bytes {
            let mut cut = self.max_output_bytes;
            while !output.is_char_boundary(cut) {
                cut -= 1;
            }
            output.truncate(cut);
            output.push_str("\n... [output truncated]");
        }
        output
    }

    fn execution_error(&self, message: impl Into<String>) -> ToolError {
        ToolError::Execution {
            tool: self.definition.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Tool for CommandTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn input_schema(&self) -> Value {
        self.definition.input_schema.clone()
    }

    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let mut command = self
            .command
            .to_command(&self.working_dir)
            .ok_or_else(|| self.execution_error("empty command"))?;

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::IoError {
                operation: format!("spawn '{}'", self.definition.name),
                source: e,
            })?;

        let payload = serde_json::to_vec(&input).map_err(|e| self.execution_error(e.to_string()))?;
        let stdin = child.stdin.take();
        let write_arguments = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            // Closing stdin signals end of input
            match stdin.write_all(&payload).await {
                // A tool that never reads its arguments closes the pipe early
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                written => written,
            }
        };

        // Arguments are fed while output is drained so neither pipe can fill up
        let (written, output) = tokio::time::timeout(Duration::from_millis(self.timeout_ms), async {
            tokio::join!(write_arguments, child.wait_with_output())
        })
        .await
        .map_err(|_| ToolError::Timeout {
            tool: self.definition.name.clone(),
            timeout_ms: self.timeout_ms,
        })?;

        written.map_err(|e| ToolError::IoError {
            operation: format!("write arguments to '{}'", self.definition.name),
            source: e,
        })?;
        let output = output.map_err(|e| ToolError::IoError {
            operation: format!("wait for '{}'", self.definition.name),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(self.execution_error(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                self.truncate(detail.trim().to_string())
            )));
        }

        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        // Structured results are returned whole; the cap only applies to plain text
        match serde_json::from_str(trimmed) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(self.truncate(trimmed.to_string()))),
        }
    }
}
