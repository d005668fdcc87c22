//! Tool declarations and configuration validation.
//!
//! The document is decoded into a generic YAML mapping before it gets here;
//! validation walks that mapping by hand so that errors can name the offending
//! entry's position. Validation stops at the first violation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::settings::RegistryConfig;
use crate::error::{KgentikError, Result};

/// Where a tool's implementation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// Authored in this project, loaded from a file next to the config
    Local,
    /// Shared within the team's registry
    Team,
    /// Published to the community registry
    Community,
}

impl ToolSource {
    pub const ALL: [ToolSource; 3] = [Self::Local, Self::Team, Self::Community];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Team => "team",
            Self::Community => "community",
        }
    }

    /// Whether tools of this source are fetched from a registry
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Team | Self::Community)
    }
}

impl FromStr for ToolSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown source '{}', expected one of: {}", s, allowed.join(", "))
            })
    }
}

impl fmt::Display for ToolSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured reference to a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDeclaration {
    pub name: String,
    pub source: ToolSource,
    /// Path relative to the config directory; present iff `source` is local
    pub file: Option<PathBuf>,
    pub description: Option<String>,
}

impl ToolDeclaration {
    pub fn local(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ToolSource::Local,
            file: Some(file.into()),
            description: None,
        }
    }

    pub fn remote(name: impl Into<String>, source: ToolSource) -> Self {
        Self {
            name: name.into(),
            source,
            file: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The parsed document: declarations in document order plus optional registry settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    pub tools: Vec<ToolDeclaration>,
    pub registry: Option<RegistryConfig>,
}

impl Configuration {
    /// Validate a decoded document into a typed configuration.
    pub fn parse(raw: &Value) -> Result<Self> {
        let document = match raw {
            Value::Mapping(map) => map,
            Value::Null => return Err(invalid(None, None, "document is empty, expected a 'tools' sequence")),
            _ => return Err(invalid(None, None, "document must be a mapping with a 'tools' sequence")),
        };

        let entries = match document.get("tools") {
            Some(Value::Sequence(entries)) => entries,
            Some(Value::Null) | None => return Err(invalid(None, None, "missing 'tools' sequence")),
            Some(_) => return Err(invalid(None, None, "'tools' must be a sequence")),
        };

        let tools = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| parse_declaration(position, entry))
            .collect::<Result<Vec<_>>>()?;

        let registry = match document.get("registry") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_yaml::from_value::<RegistryConfig>(value.clone())
                    .map_err(|e| invalid(None, None, format!("invalid 'registry' section: {}", e)))?,
            ),
        };

        Ok(Self { tools, registry })
    }

    /// Decode and validate a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: Value = serde_yaml::from_str(content)?;
        Self::parse(&raw)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

fn parse_declaration(position: usize, entry: &Value) -> Result<ToolDeclaration> {
    let map = entry
        .as_mapping()
        .ok_or_else(|| invalid(Some(position), None, "entry must be a mapping"))?;

    let name = required_string(map, "name")
        .map_err(|reason| invalid(Some(position), None, reason))?;
    let at = |reason: String| invalid(Some(position), Some(&name), reason);

    let source_raw = required_string(map, "source").map_err(at)?;
    let source = ToolSource::from_str(&source_raw).map_err(at)?;

    let file = optional_string(map, "file").map_err(at)?;
    let description = optional_string(map, "description").map_err(at)?;

    let file = match (source, file) {
        (ToolSource::Local, Some(file)) if !file.trim().is_empty() => Some(PathBuf::from(file)),
        (ToolSource::Local, _) => return Err(at("local tool requires a non-empty 'file'".to_string())),
        (_, Some(file)) if !file.trim().is_empty() => {
            return Err(at(format!("'file' is only valid for local tools, not {}", source)));
        }
        _ => None,
    };

    Ok(ToolDeclaration {
        name,
        source,
        file,
        description,
    })
}

fn required_string(map: &Mapping, key: &str) -> std::result::Result<String, String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(format!("'{}' must not be empty", key)),
        Some(Value::Null) | None => Err(format!("missing required '{}'", key)),
        Some(_) => Err(format!("'{}' must be a string", key)),
    }
}

fn optional_string(map: &Mapping, key: &str) -> std::result::Result<Option<String>, String> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(format!("'{}' must be a string", key)),
    }
}

fn invalid(position: Option<usize>, name: Option<&str>, reason: impl Into<String>) -> KgentikError {
    KgentikError::InvalidConfig {
        position,
        name: name.map(String::from),
        reason: reason.into(),
    }
}
