//! Public entry point
//!
//! [`KgentikTools`] ties the pipeline together: locate the configuration,
//! validate it, then run one resolution pass per `get_tools` call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{self, Configuration, RegistryConfig, Settings};
use crate::error::Result;
use crate::loader::{CodeLoader, LocalModuleLoader, ManifestLoader};
use crate::remote::{HttpRegistryClient, RemoteClient, RemoteToolResolver};
use crate::resolution::{FailurePolicy, ResolutionContext, SourceDispatcher, ToolRegistry};
use crate::tools::ToolSet;

/// Resolves the tools declared in a kgentik.yaml.
///
/// The configuration is located once at construction. Each call to
/// [`get_tools`](Self::get_tools) re-reads it and uses a fresh
/// [`ResolutionContext`], so remote caches never leak between calls.
pub struct KgentikTools {
    config_path: PathBuf,
    settings: Settings,
    code_loader: Option<Arc<dyn CodeLoader>>,
    remote_client: Option<Arc<dyn RemoteClient>>,
    policy: Option<FailurePolicy>,
}

impl KgentikTools {
    /// Locate the configuration, explicitly or by searching upward from the
    /// working directory. Fails with `ConfigNotFound` if there is none.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config::locate(config_path.as_deref())?;
        let settings = Settings::load(None)?;
        Ok(Self {
            config_path,
            settings,
            code_loader: None,
            remote_client: None,
            policy: None,
        })
    }

    /// Replace the loader used for local tool files
    pub fn with_code_loader(mut self, loader: Arc<dyn CodeLoader>) -> Self {
        self.code_loader = Some(loader);
        self
    }

    /// Replace the registry client used for team and community tools
    pub fn with_remote_client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.remote_client = Some(client);
        self
    }

    /// Override the failure policy from settings
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy.unwrap_or(self.settings.policy)
    }

    /// Directory that relative local `file` paths are resolved against
    pub fn base_dir(&self) -> PathBuf {
        let parent = match self.config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
    }

    /// Read and validate the configuration without resolving anything
    pub fn load_configuration(&self) -> Result<Configuration> {
        config::load_configuration(&self.config_path)
    }

    /// Resolve every declared tool, in declaration order
    pub async fn get_tools(&self) -> Result<ToolSet> {
        let configuration = self.load_configuration()?;
        let policy = self.policy();

        let dispatcher = SourceDispatcher::new(
            LocalModuleLoader::new(self.code_loader()),
            RemoteToolResolver::new(self.remote_client(configuration.registry.as_ref())?),
        );
        let registry = ToolRegistry::new(Arc::new(dispatcher)).with_policy(policy);
        let mut ctx = ResolutionContext::new(self.base_dir());

        tracing::info!(
            config = %self.config_path.display(),
            tools = configuration.len(),
            policy = %policy,
            "starting resolution pass"
        );
        registry.aggregate(&configuration.tools, &mut ctx).await
    }

    fn code_loader(&self) -> Arc<dyn CodeLoader> {
        match &self.code_loader {
            Some(loader) => Arc::clone(loader),
            None => Arc::new(ManifestLoader::new().with_default_timeout(self.settings.invocation_timeout_ms)),
        }
    }

    fn remote_client(&self, project: Option<&RegistryConfig>) -> Result<Arc<dyn RemoteClient>> {
        if let Some(client) = &self.remote_client {
            return Ok(Arc::clone(client));
        }
        let registry = self.settings.effective_registry(project);
        if !registry.is_configured() {
            log::debug!("No registry URLs configured; remote declarations will fail");
        }
        Ok(Arc::new(HttpRegistryClient::new(&registry)?))
    }
}

impl fmt::Display for KgentikTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KgentikTools(config_path='{}')", self.config_path.display())
    }
}

impl fmt::Debug for KgentikTools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KgentikTools")
            .field("config_path", &self.config_path)
            .field("policy", &self.policy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSource;
    use crate::error::KgentikError;
    use crate::remote::{RemoteScope, ToolMetadata, TransportError};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::tempdir;

    struct EmptyRegistry;

    #[async_trait]
    impl RemoteClient for EmptyRegistry {
        async fn fetch_tool(&self, _: RemoteScope, _: &str) -> std::result::Result<Option<ToolMetadata>, TransportError> {
            Ok(None)
        }

        async fn invoke_tool(&self, _: RemoteScope, _: &str, _: Value) -> std::result::Result<Value, TransportError> {
            Ok(Value::Null)
        }
    }

    fn write_project(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir.join("tools")).unwrap();
        fs::write(
            dir.join("tools/csv_parser.yaml"),
            "exports:\n  csv_parser:\n    name: csv_parser\n    description: Parse CSV\n    command: cat\n",
        )
        .unwrap();
        let config = dir.join("kgentik.yaml");
        fs::write(
            &config,
            "tools:\n  - name: csv_parser\n    source: local\n    file: tools/csv_parser.yaml\n",
        )
        .unwrap();
        config
    }

    fn engine(config: PathBuf) -> KgentikTools {
        KgentikTools::new(Some(config))
            .unwrap()
            .with_settings(Settings::default())
            .with_remote_client(Arc::new(EmptyRegistry))
    }

    #[test]
    fn test_new_with_missing_explicit_path() {
        let dir = tempdir().unwrap();
        let err = KgentikTools::new(Some(dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, KgentikError::ConfigNotFound { explicit: true, .. }));
    }

    #[test]
    fn test_display() {
        let dir = tempdir().unwrap();
        let config = write_project(dir.path());
        let tools = engine(config.clone());
        assert_eq!(tools.to_string(), format!("KgentikTools(config_path='{}')", config.display()));
    }

    #[test]
    fn test_base_dir_is_config_parent() {
        let dir = tempdir().unwrap();
        let config = write_project(dir.path());
        assert_eq!(engine(config).base_dir(), dir.path());
    }

    #[test]
    fn test_policy_override() {
        let dir = tempdir().unwrap();
        let tools = engine(write_project(dir.path()));
        assert_eq!(tools.policy(), FailurePolicy::FailFast);
        assert_eq!(tools.with_policy(FailurePolicy::CollectAll).policy(), FailurePolicy::CollectAll);
    }

    #[tokio::test]
    async fn test_get_tools_resolves_and_invokes_local_tool() {
        let dir = tempdir().unwrap();
        let tools = engine(write_project(dir.path()));

        let set = tools.get_tools().await.unwrap();
        assert_eq!(set.names(), vec!["csv_parser"]);

        let handle = set.get("csv_parser").unwrap();
        assert_eq!(handle.source(), ToolSource::Local);
        let out = handle.invoke(json!({"path": "data.csv"})).await.unwrap();
        assert_eq!(out, json!({"path": "data.csv"}));
    }

    #[tokio::test]
    async fn test_get_tools_rereads_configuration() {
        let dir = tempdir().unwrap();
        let config = write_project(dir.path());
        let tools = engine(config.clone());
        assert_eq!(tools.get_tools().await.unwrap().len(), 1);

        fs::write(&config, "tools: []\n").unwrap();
        assert!(tools.get_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_tools_remote_not_found() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("kgentik.yaml");
        fs::write(&config, "tools:\n  - name: web-scraper\n    source: community\n").unwrap();

        let err = engine(config).get_tools().await.unwrap_err();
        assert!(matches!(
            err,
            KgentikError::ToolNotFound {
                origin: ToolSource::Community,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_default_client_without_registry_fails_remote_fetch() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("kgentik.yaml");
        fs::write(&config, "tools:\n  - name: summarize\n    source: team\n").unwrap();

        let tools = KgentikTools::new(Some(config)).unwrap().with_settings(Settings::default());
        let err = tools.get_tools().await.unwrap_err();
        match err {
            KgentikError::RemoteFetchFailed { name, reason, .. } => {
                assert_eq!(name, "summarize");
                assert!(reason.contains("no team registry URL configured"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
