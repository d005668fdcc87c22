//! Routes each declaration to the resolver for its provenance

use async_trait::async_trait;

use super::{ResolutionContext, ToolResolver};
use crate::config::{ToolDeclaration, ToolSource};
use crate::error::Result;
use crate::loader::LocalModuleLoader;
use crate::remote::RemoteToolResolver;
use crate::tools::ToolHandle;

/// Stateless dispatch over [`ToolSource`].
///
/// The match in [`resolve`](ToolResolver::resolve) is the dispatch table; a
/// new provenance is a new `ToolSource` variant plus an arm here.
#[derive(Clone)]
pub struct SourceDispatcher {
    local: LocalModuleLoader,
    remote: RemoteToolResolver,
}

impl SourceDispatcher {
    pub fn new(local: LocalModuleLoader, remote: RemoteToolResolver) -> Self {
        Self { local, remote }
    }
}

#[async_trait]
impl ToolResolver for SourceDispatcher {
    async fn resolve(&self, declaration: &ToolDeclaration, ctx: &mut ResolutionContext) -> Result<ToolHandle> {
        tracing::debug!(tool = %declaration.name, source = %declaration.source, "dispatching");
        match declaration.source {
            ToolSource::Local => self.local.resolve(declaration, ctx).await,
            ToolSource::Team | ToolSource::Community => self.remote.resolve(declaration, ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{CodeLoader, LoadedModule, ModuleExport};
    use crate::remote::{RemoteClient, RemoteScope, ToolMetadata, TransportError};
    use crate::tools::{Tool, ToolError};
    use serde_json::{Value, json};
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned(String);

    #[async_trait]
    impl Tool for Canned {
        fn name(&self) -> &str {
            &self.0
        }

        fn description(&self) -> &str {
            "canned"
        }

        async fn invoke(&self, _input: Value) -> std::result::Result<Value, ToolError> {
            Ok(json!(self.0))
        }
    }

    /// Every path exists and exports one tool named after the file stem
    #[derive(Default)]
    struct StemLoader {
        loads: AtomicUsize,
    }

    impl CodeLoader for StemLoader {
        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn load_module(&self, path: &Path) -> eyre::Result<LoadedModule> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            Ok(LoadedModule::new(vec![ModuleExport::tool(
                stem,
                Arc::new(Canned(stem.to_string())),
            )]))
        }
    }

    #[derive(Default)]
    struct CountingRegistry {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl RemoteClient for CountingRegistry {
        async fn fetch_tool(
            &self,
            scope: RemoteScope,
            name: &str,
        ) -> std::result::Result<Option<ToolMetadata>, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ToolMetadata::new(name, format!("{} tool", scope))))
        }

        async fn invoke_tool(
            &self,
            _scope: RemoteScope,
            _name: &str,
            arguments: Value,
        ) -> std::result::Result<Value, TransportError> {
            Ok(arguments)
        }
    }

    fn dispatcher() -> (SourceDispatcher, Arc<StemLoader>, Arc<CountingRegistry>) {
        let loader = Arc::new(StemLoader::default());
        let registry = Arc::new(CountingRegistry::default());
        let dispatcher = SourceDispatcher::new(
            LocalModuleLoader::new(loader.clone()),
            RemoteToolResolver::new(registry.clone()),
        );
        (dispatcher, loader, registry)
    }

    #[tokio::test]
    async fn test_local_goes_to_module_loader() {
        let (dispatcher, loader, registry) = dispatcher();
        let mut ctx = ResolutionContext::new("/proj");

        let handle = dispatcher
            .resolve(&ToolDeclaration::local("csv_parser", "tools/csv_parser.yaml"), &mut ctx)
            .await
            .unwrap();

        assert_eq!(handle.source(), ToolSource::Local);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_sources_go_to_registry() {
        let (dispatcher, loader, registry) = dispatcher();
        let mut ctx = ResolutionContext::new("/proj");

        let team = dispatcher
            .resolve(&ToolDeclaration::remote("summarize", ToolSource::Team), &mut ctx)
            .await
            .unwrap();
        let community = dispatcher
            .resolve(&ToolDeclaration::remote("web-scraper", ToolSource::Community), &mut ctx)
            .await
            .unwrap();

        assert_eq!(team.source(), ToolSource::Team);
        assert_eq!(team.description(), "team tool");
        assert_eq!(community.source(), ToolSource::Community);
        assert_eq!(registry.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
    }
}
