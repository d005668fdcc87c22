//! Error types for Kgentik
//!
//! Centralized error handling using thiserror. Every variant raised during a
//! resolution pass names the offending tool and its declared source; local
//! failures also carry the resolved absolute path.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ToolSource;
use crate::remote::TransportError;

/// All error types that can occur while locating, validating and resolving tools
#[derive(Debug, Error)]
pub enum KgentikError {
    /// No configuration document at the explicit path or anywhere up the search chain
    #[error("{}", config_not_found_message(.path, *.explicit))]
    ConfigNotFound { path: PathBuf, explicit: bool },

    /// The configuration document exists but could not be read
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid YAML
    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Structural violation in the configuration document
    #[error("Invalid config{}: {reason}", entry_label(*.position, .name.as_deref()))]
    InvalidConfig {
        position: Option<usize>,
        name: Option<String>,
        reason: String,
    },

    /// A local declaration points at a file that does not exist
    #[error("Tool file not found for '{name}' (local): {path}")]
    ToolFileNotFound { name: String, path: PathBuf },

    /// A local tool file exists but could not be loaded as a module
    #[error("Failed to load module for '{name}' (local) from {path}: {reason}")]
    ModuleLoadFailed { name: String, path: PathBuf, reason: String },

    /// The loaded module exports nothing tool-shaped
    #[error("No tool export found for '{name}' (local) in {path}")]
    NoToolExport { name: String, path: PathBuf },

    /// The loaded module exports several tools and none matches the declared name
    #[error(
        "Ambiguous tool export for '{name}' (local) in {path}: candidates [{}]",
        .candidates.join(", ")
    )]
    AmbiguousToolExport {
        name: String,
        path: PathBuf,
        candidates: Vec<String>,
    },

    /// Transport failure talking to a team or community registry
    #[error("Failed to fetch '{name}' ({origin}): {reason}")]
    RemoteFetchFailed {
        name: String,
        origin: ToolSource,
        reason: String,
    },

    /// The remote registry reported no tool with this name
    #[error("Tool '{name}' not found in {origin} registry")]
    ToolNotFound { name: String, origin: ToolSource },

    /// A declaration reached a resolver that cannot handle its source
    #[error("Unknown source '{origin}' for tool '{name}'")]
    UnknownSource { name: String, origin: String },

    /// Two or more resolved handles share a name
    #[error("Duplicate tool name(s): {}", format_collisions(.collisions))]
    DuplicateToolName { collisions: Vec<NameCollision> },

    /// One or more declarations failed under the collect-all policy
    #[error("{} tool(s) failed to resolve: {}", .failures.len(), format_failures(.failures))]
    ResolutionFailed { failures: Vec<KgentikError> },

    /// The default registry client could not be constructed
    #[error("Registry client error: {0}")]
    RegistryClient(#[from] TransportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Kgentik operations
pub type Result<T> = std::result::Result<T, KgentikError>;

/// A tool name shared by several declarations, with their zero-based positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollision {
    pub name: String,
    pub positions: Vec<usize>,
}

impl fmt::Display for NameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self.positions.iter().map(|p| format!("#{}", p)).collect();
        write!(f, "'{}' at {}", self.name, positions.join(", "))
    }
}

impl KgentikError {
    /// Name of the tool the failure concerns, if any
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::InvalidConfig { name, .. } => name.as_deref(),
            Self::ToolFileNotFound { name, .. }
            | Self::ModuleLoadFailed { name, .. }
            | Self::NoToolExport { name, .. }
            | Self::AmbiguousToolExport { name, .. }
            | Self::RemoteFetchFailed { name, .. }
            | Self::ToolNotFound { name, .. }
            | Self::UnknownSource { name, .. } => Some(name),
            _ => None,
        }
    }

    /// True for failures that happen before any declaration is dispatched
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigRead { .. } | Self::ConfigParse { .. } | Self::InvalidConfig { .. }
        )
    }
}

fn config_not_found_message(path: &std::path::Path, explicit: bool) -> String {
    if explicit {
        format!("Config file not found: {}", path.display())
    } else {
        format!(
            "No kgentik.yaml found in {} or any parent directory. Run from a Kgentik project directory or pass an explicit config path.",
            path.display()
        )
    }
}

fn entry_label(position: Option<usize>, name: Option<&str>) -> String {
    match (position, name) {
        (Some(pos), Some(name)) => format!(" (tools[{}] '{}')", pos, name),
        (Some(pos), None) => format!(" (tools[{}])", pos),
        (None, Some(name)) => format!(" ('{}')", name),
        (None, None) => String::new(),
    }
}

fn format_collisions(collisions: &[NameCollision]) -> String {
    collisions.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn format_failures(failures: &[KgentikError]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
