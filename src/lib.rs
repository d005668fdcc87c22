//! Kgentik - declarative tool resolution for agents
//!
//! Tools are declared in a kgentik.yaml, each tagged with its provenance
//! (`local`, `team` or `community`). Kgentik locates and validates that
//! document, resolves every declaration through the strategy for its source,
//! and returns one ordered [`ToolSet`] of invocable handles.

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod remote;
pub mod resolution;
pub mod tools;

pub use config::{Configuration, RegistryConfig, Settings, ToolDeclaration, ToolSource};
pub use engine::KgentikTools;
pub use error::{KgentikError, NameCollision, Result};
pub use loader::{CodeLoader, LoadedModule, LocalModuleLoader, ManifestLoader, ModuleExport};
pub use remote::{HttpRegistryClient, RemoteClient, RemoteScope, RemoteTool, RemoteToolResolver, ToolCache, ToolMetadata, TransportError};
pub use resolution::{FailurePolicy, ResolutionContext, SourceDispatcher, ToolRegistry, ToolResolver};
pub use tools::{CommandSpec, CommandTool, Tool, ToolDefinition, ToolError, ToolHandle, ToolSet};
