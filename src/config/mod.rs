//! Configuration system for Kgentik.
//!
//! Two layers:
//! 1. The project tool configuration (kgentik.yaml), discovered upward from the
//!    working directory and validated into a [`Configuration`]
//! 2. User settings (~/.config/kgentik/kgentik.yml) for registry endpoints and policy

use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::{KgentikError, Result};

pub use self::declaration::{Configuration, ToolDeclaration, ToolSource};
pub use self::locator::{CONFIG_FILE_NAMES, locate, locate_from};
pub use self::settings::{
    COMMUNITY_REGISTRY_ENV, DEFAULT_INVOCATION_TIMEOUT_MS, DEFAULT_REGISTRY_TIMEOUT_MS, RegistryConfig, Settings,
    TEAM_REGISTRY_ENV,
};

mod declaration;
mod locator;
mod settings;

/// Read and decode a configuration document into a generic YAML value.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| KgentikError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| KgentikError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read, decode and validate a configuration document.
pub fn load_configuration(path: &Path) -> Result<Configuration> {
    let raw = load_document(path)?;
    let config = Configuration::parse(&raw)?;
    log::info!("Loaded {} tool declaration(s) from {}", config.len(), path.display());
    Ok(config)
}
