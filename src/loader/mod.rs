//! Local module loading.
//!
//! Reading a tool file and turning it into exports is delegated to an
//! injectable [`CodeLoader`], so the selection policy here can be exercised
//! with canned modules. [`ManifestLoader`] is the loader used in production.
//!
//! Export selection for a declaration named `expected`:
//! 1. a tool-shaped export whose tool name or symbol equals `expected`
//! 2. otherwise the only tool-shaped export, if there is exactly one
//! 3. otherwise `NoToolExport` (none) or `AmbiguousToolExport` (several)

mod manifest;

pub use manifest::ManifestLoader;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ToolDeclaration, ToolSource};
use crate::error::{KgentikError, Result};
use crate::resolution::{ResolutionContext, ToolResolver};
use crate::tools::{Tool, ToolHandle};

/// Capability that turns a file on disk into a set of exports
pub trait CodeLoader: Send + Sync {
    /// Whether a module exists at `path`
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Load the module at `path`. Each call yields an independent module.
    fn load_module(&self, path: &Path) -> eyre::Result<LoadedModule>;
}

/// One symbol exported by a loaded module
#[derive(Clone)]
pub struct ModuleExport {
    pub symbol: String,
    /// `None` when the export does not expose the tool capability set
    pub tool: Option<Arc<dyn Tool>>,
}

impl ModuleExport {
    pub fn tool(symbol: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        Self {
            symbol: symbol.into(),
            tool: Some(tool),
        }
    }

    pub fn value(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            tool: None,
        }
    }

    fn matches(&self, expected: &str) -> bool {
        self.symbol == expected || self.tool.as_ref().is_some_and(|t| t.name() == expected)
    }
}

impl std::fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleExport")
            .field("symbol", &self.symbol)
            .field("tool", &self.tool.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}

/// The exports of one loaded module, in declaration order
#[derive(Debug, Clone, Default)]
pub struct LoadedModule {
    pub exports: Vec<ModuleExport>,
}

impl LoadedModule {
    pub fn new(exports: Vec<ModuleExport>) -> Self {
        Self { exports }
    }

    /// Exports that expose the tool capability set
    pub fn tool_exports(&self) -> impl Iterator<Item = (&str, &Arc<dyn Tool>)> {
        self.exports
            .iter()
            .filter_map(|e| e.tool.as_ref().map(|tool| (e.symbol.as_str(), tool)))
    }
}

/// Resolves local declarations by loading their file through a [`CodeLoader`]
#[derive(Clone)]
pub struct LocalModuleLoader {
    loader: Arc<dyn CodeLoader>,
}

impl LocalModuleLoader {
    pub fn new(loader: Arc<dyn CodeLoader>) -> Self {
        Self { loader }
    }

    /// Load `relative_file` against `base_dir` and pick the export for `expected_name`.
    pub fn load(&self, base_dir: &Path, relative_file: &Path, expected_name: &str) -> Result<ToolHandle> {
        let path = absolute_path(&base_dir.join(relative_file));

        if !self.loader.exists(&path) {
            return Err(KgentikError::ToolFileNotFound {
                name: expected_name.to_string(),
                path,
            });
        }

        let module = self
            .loader
            .load_module(&path)
            .map_err(|e| KgentikError::ModuleLoadFailed {
                name: expected_name.to_string(),
                path: path.clone(),
                reason: format!("{:#}", e),
            })?;

        let tool = select_export(&module, expected_name, &path)?;
        log::debug!("Loaded '{}' from {} (tool '{}')", expected_name, path.display(), tool.name());
        Ok(ToolHandle::new(expected_name, ToolSource::Local, tool))
    }
}

#[async_trait]
impl ToolResolver for LocalModuleLoader {
    async fn resolve(&self, declaration: &ToolDeclaration, ctx: &mut ResolutionContext) -> Result<ToolHandle> {
        if declaration.source != ToolSource::Local {
            return Err(KgentikError::UnknownSource {
                name: declaration.name.clone(),
                origin: declaration.source.to_string(),
            });
        }
        let file = declaration.file.as_deref().ok_or_else(|| KgentikError::InvalidConfig {
            position: None,
            name: Some(declaration.name.clone()),
            reason: "local tool requires a non-empty 'file'".to_string(),
        })?;
        self.load(ctx.base_dir(), file, &declaration.name)
    }
}

fn select_export(module: &LoadedModule, expected: &str, path: &Path) -> Result<Arc<dyn Tool>> {
    if let Some(export) = module.exports.iter().find(|e| e.tool.is_some() && e.matches(expected))
        && let Some(tool) = &export.tool
    {
        return Ok(Arc::clone(tool));
    }

    let candidates: Vec<(&str, &Arc<dyn Tool>)> = module.tool_exports().collect();
    match candidates.as_slice() {
        [] => Err(KgentikError::NoToolExport {
            name: expected.to_string(),
            path: path.to_path_buf(),
        }),
        [(_, tool)] => Ok(Arc::clone(tool)),
        many => Err(KgentikError::AmbiguousToolExport {
            name: expected.to_string(),
            path: path.to_path_buf(),
            candidates: many.iter().map(|(symbol, _)| symbol.to_string()).collect(),
        }),
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
