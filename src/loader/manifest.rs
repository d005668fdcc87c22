//! YAML/JSON tool modules.
//!
//! A local tool file is a manifest with an `exports` mapping:
//!
//! ```yaml
//! exports:
//!   csv_parser:
//!     name: csv_parser
//!     description: Parse a CSV file into rows
//!     command: ["python3", "csv_parser.py"]
//!     timeout_ms: 10000
//!     input_schema:
//!       type: object
//!       properties:
//!         path: { type: string }
//!       required: [path]
//!   DEFAULT_DELIMITER: ","
//! ```
//!
//! An export is tool-shaped when it has a non-empty `name`, `description` and
//! `command`. Commands run with the manifest's directory as working directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use eyre::{Context, eyre};
use serde::Deserialize;
use serde_yaml::Value;

use super::{CodeLoader, LoadedModule, ModuleExport};
use crate::config::DEFAULT_INVOCATION_TIMEOUT_MS;
use crate::tools::{CommandSpec, CommandTool, ToolDefinition};

/// Raw shape of a tool-shaped export
#[derive(Debug, Deserialize)]
struct ExportSpec {
    name: String,
    description: String,
    command: CommandSpec,
    #[serde(default)]
    input_schema: Option<serde_json::Value>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    max_output_bytes: Option<usize>,
}

impl ExportSpec {
    fn is_tool_shaped(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty() && !self.command.is_empty()
    }
}

/// Loads tool modules from YAML (or JSON) manifests
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    default_timeout_ms: u64,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self {
            default_timeout_ms: DEFAULT_INVOCATION_TIMEOUT_MS,
        }
    }

    /// Timeout for exports that do not set their own
    pub fn with_default_timeout(mut self, timeout_ms: u64) -> Self {
        self.default_timeout_ms = timeout_ms;
        self
    }

    /// Parse manifest content; `dir` becomes the working directory of its commands
    pub fn parse_module(&self, content: &str, dir: &Path) -> eyre::Result<LoadedModule> {
        let document: Value = serde_yaml::from_str(content).context("Failed to parse module")?;
        let exports = match document.get("exports") {
            Some(Value::Mapping(exports)) => exports,
            Some(Value::Null) | None => {
                log::debug!("Module in {} exports nothing", dir.display());
                return Ok(LoadedModule::new(Vec::new()));
            }
            Some(_) => return Err(eyre!("'exports' must be a mapping")),
        };

        let mut loaded = Vec::with_capacity(exports.len());
        for (symbol, value) in exports {
            let symbol = symbol
                .as_str()
                .ok_or_else(|| eyre!("export names must be strings, found {:?}", symbol))?;
            loaded.push(self.convert_export(symbol, value, dir));
        }

        Ok(LoadedModule::new(loaded))
    }

    fn convert_export(&self, symbol: &str, value: &Value, dir: &Path) -> ModuleExport {
        if !value.is_mapping() {
            return ModuleExport::value(symbol);
        }

        let spec = match serde_yaml::from_value::<ExportSpec>(value.clone()) {
            Ok(spec) if spec.is_tool_shaped() => spec,
            Ok(_) => {
                log::debug!("Export '{}' has empty tool fields, treating as a plain value", symbol);
                return ModuleExport::value(symbol);
            }
            Err(e) => {
                log::debug!("Export '{}' is not tool-shaped: {}", symbol, e);
                return ModuleExport::value(symbol);
            }
        };

        let mut definition = ToolDefinition::new(spec.name, spec.description);
        if let Some(schema) = spec.input_schema {
            definition = definition.with_schema(schema);
        }

        let mut tool = CommandTool::new(
            definition,
            spec.command,
            dir,
            spec.timeout_ms.unwrap_or(self.default_timeout_ms),
        );
        if let Some(max_output) = spec.max_output_bytes {
            tool = tool.with_max_output(max_output);
        }

        ModuleExport::tool(symbol, Arc::new(tool))
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeLoader for ManifestLoader {
    fn load_module(&self, path: &Path) -> eyre::Result<LoadedModule> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read module {}", path.display()))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.parse_module(&content, dir)
    }
}
