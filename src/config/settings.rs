//! Resolver settings.
//!
//! Loaded from ~/.config/kgentik/kgentik.yml and layered with the project
//! document's `registry` section and environment overrides:
//! environment > project document > user settings > defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KgentikError, Result};
use crate::resolution::FailurePolicy;

/// Environment variable overriding the team registry URL
pub const TEAM_REGISTRY_ENV: &str = "KGENTIK_TEAM_REGISTRY_URL";

/// Environment variable overriding the community registry URL
pub const COMMUNITY_REGISTRY_ENV: &str = "KGENTIK_COMMUNITY_REGISTRY_URL";

/// Default registry request timeout
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for one local tool invocation
pub const DEFAULT_INVOCATION_TIMEOUT_MS: u64 = 120_000;

/// Registry endpoints for remote tools. Unset fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub team_url: Option<String>,
    pub community_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl RegistryConfig {
    /// Layer `over` on top of `self`; fields set in `over` win.
    pub fn merged_with(&self, over: &RegistryConfig) -> RegistryConfig {
        RegistryConfig {
            team_url: over.team_url.clone().or_else(|| self.team_url.clone()),
            community_url: over.community_url.clone().or_else(|| self.community_url.clone()),
            timeout_ms: over.timeout_ms.or(self.timeout_ms),
        }
    }

    /// Registry URLs taken from the environment
    pub fn from_env() -> RegistryConfig {
        RegistryConfig {
            team_url: non_empty_env(TEAM_REGISTRY_ENV),
            community_url: non_empty_env(COMMUNITY_REGISTRY_ENV),
            timeout_ms: None,
        }
    }

    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_REGISTRY_TIMEOUT_MS)
    }

    /// True when at least one registry endpoint is configured
    pub fn is_configured(&self) -> bool {
        self.team_url.is_some() || self.community_url.is_some()
    }
}

/// User-level settings for the resolver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistryConfig,
    pub policy: FailurePolicy,
    pub invocation_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            policy: FailurePolicy::FailFast,
            invocation_timeout_ms: DEFAULT_INVOCATION_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Load settings with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided (errors are returned)
    /// 2. ~/.config/kgentik/kgentik.yml (errors are logged and ignored)
    /// 3. Defaults
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = settings_path {
            return Self::load_from_file(path);
        }

        if let Some(user_settings) = Self::user_settings_path()
            && user_settings.exists()
        {
            match Self::load_from_file(&user_settings) {
                Ok(settings) => return Ok(settings),
                Err(e) => {
                    log::warn!("Failed to load {}: {}", user_settings.display(), e);
                }
            }
        }

        log::debug!("No user settings found, using defaults");
        Ok(Self::default())
    }

    /// Location of the user settings file
    pub fn user_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kgentik").join("kgentik.yml"))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| KgentikError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = serde_yaml::from_str(&content).map_err(|e| KgentikError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Loaded settings from: {}", path.display());
        Ok(settings)
    }

    /// Registry settings after layering the project section and the environment.
    pub fn effective_registry(&self, project: Option<&RegistryConfig>) -> RegistryConfig {
        self.effective_registry_with_env(project, &RegistryConfig::from_env())
    }

    fn effective_registry_with_env(&self, project: Option<&RegistryConfig>, env: &RegistryConfig) -> RegistryConfig {
        let layered = match project {
            Some(project) => self.registry.merged_with(project),
            None => self.registry.clone(),
        };
        layered.merged_with(env)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
