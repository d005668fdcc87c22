//! Remote tool resolution for team and community registries.
//!
//! Remote tools are never executed locally. A registry returns metadata, and
//! the resolved handle wraps a [`RemoteTool`] proxy that forwards each
//! invocation back to the registry through the same [`RemoteClient`].

mod cache;
mod http;

pub use cache::ToolCache;
pub use http::HttpRegistryClient;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ToolDeclaration, ToolSource};
use crate::error::{KgentikError, Result};
use crate::resolution::{ResolutionContext, ToolResolver};
use crate::tools::{Tool, ToolDefinition, ToolError, ToolHandle};

/// Which registry a remote declaration is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteScope {
    Team,
    Community,
}

impl RemoteScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Community => "community",
        }
    }

    /// Scope for a declaration; a local declaration here is an invariant violation
    pub fn for_declaration(declaration: &ToolDeclaration) -> Result<Self> {
        Self::try_from(declaration.source).map_err(|source| KgentikError::UnknownSource {
            name: declaration.name.clone(),
            origin: source.to_string(),
        })
    }
}

impl fmt::Display for RemoteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RemoteScope> for ToolSource {
    fn from(scope: RemoteScope) -> Self {
        match scope {
            RemoteScope::Team => ToolSource::Team,
            RemoteScope::Community => ToolSource::Community,
        }
    }
}

impl TryFrom<ToolSource> for RemoteScope {
    type Error = ToolSource;

    fn try_from(source: ToolSource) -> std::result::Result<Self, Self::Error> {
        match source {
            ToolSource::Team => Ok(Self::Team),
            ToolSource::Community => Ok(Self::Community),
            ToolSource::Local => Err(source),
        }
    }
}

/// What a registry reports about a published tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    #[serde(default = "ToolDefinition::empty_schema")]
    pub input_schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: ToolDefinition::empty_schema(),
            version: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Failures talking to a registry
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("invalid registry URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no {scope} registry URL configured")]
    Unconfigured { scope: RemoteScope },

    /// The registry ran the tool and it reported a failure
    #[error("{message}")]
    Remote { message: String },
}

/// Client for team and community registries
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Fetch metadata for `name`; `Ok(None)` means the registry has no such tool
    async fn fetch_tool(
        &self,
        scope: RemoteScope,
        name: &str,
    ) -> std::result::Result<Option<ToolMetadata>, TransportError>;

    /// Run `name` on the registry side with structured arguments
    async fn invoke_tool(
        &self,
        scope: RemoteScope,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<Value, TransportError>;
}

/// Invocation proxy for a registry-hosted tool
pub struct RemoteTool {
    scope: RemoteScope,
    metadata: ToolMetadata,
    client: Arc<dyn RemoteClient>,
}

impl RemoteTool {
    pub fn new(scope: RemoteScope, metadata: ToolMetadata, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            scope,
            metadata,
            client,
        }
    }

    pub fn scope(&self) -> RemoteScope {
        self.scope
    }

    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn input_schema(&self) -> Value {
        self.metadata.input_schema.clone()
    }

    async fn invoke(&self, input: Value) -> std::result::Result<Value, ToolError> {
        self.client
            .invoke_tool(self.scope, &self.metadata.name, input)
            .await
            .map_err(|e| match e {
                TransportError::Remote { message } => ToolError::Execution {
                    tool: self.metadata.name.clone(),
                    message,
                },
                other => ToolError::Transport {
                    tool: self.metadata.name.clone(),
                    message: other.to_string(),
                },
            })
    }
}

/// Fetches remote tools through a [`RemoteClient`], caching per resolution pass
#[derive(Clone)]
pub struct RemoteToolResolver {
    client: Arc<dyn RemoteClient>,
}

impl RemoteToolResolver {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self { client }
    }

    /// Resolve `(scope, name)`, consulting and filling `cache`
    pub async fn fetch(&self, scope: RemoteScope, name: &str, cache: &mut ToolCache) -> Result<ToolHandle> {
        if let Some(handle) = cache.get(scope, name) {
            tracing::debug!(tool = %name, source = %scope, "remote tool cache hit");
            return Ok(handle.clone());
        }

        tracing::debug!(tool = %name, source = %scope, "fetching remote tool");
        let metadata = self
            .client
            .fetch_tool(scope, name)
            .await
            .map_err(|e| KgentikError::RemoteFetchFailed {
                name: name.to_string(),
                origin: scope.into(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| KgentikError::ToolNotFound {
                name: name.to_string(),
                origin: scope.into(),
            })?;

        let tool = RemoteTool::new(scope, metadata, Arc::clone(&self.client));
        let handle = ToolHandle::new(name, scope.into(), Arc::new(tool));
        Ok(cache.insert(scope, name, handle).clone())
    }
}

#[async_trait]
impl ToolResolver for RemoteToolResolver {
    async fn resolve(&self, declaration: &ToolDeclaration, ctx: &mut ResolutionContext) -> Result<ToolHandle> {
        let scope = RemoteScope::for_declaration(declaration)?;
        self.fetch(scope, &declaration.name, ctx.cache_mut()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Registry double that counts fetches and echoes invocations
    #[derive(Default)]
    struct MockRegistry {
        tools: HashMap<(RemoteScope, String), ToolMetadata>,
        unreachable: bool,
        fetches: AtomicUsize,
    }

    impl MockRegistry {
        fn with_tool(mut self, scope: RemoteScope, metadata: ToolMetadata) -> Self {
            self.tools.insert((scope, metadata.name.clone()), metadata);
            self
        }

        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Default::default()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteClient for MockRegistry {
        async fn fetch_tool(
            &self,
            scope: RemoteScope,
            name: &str,
        ) -> std::result::Result<Option<ToolMetadata>, TransportError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.unreachable {
                return Err(TransportError::Status {
                    status: 503,
                    message: "service unavailable".to_string(),
                });
            }
            Ok(self.tools.get(&(scope, name.to_string())).cloned())
        }

        async fn invoke_tool(
            &self,
            scope: RemoteScope,
            name: &str,
            arguments: Value,
        ) -> std::result::Result<Value, TransportError> {
            if arguments.get("fail").is_some() {
                return Err(TransportError::Remote {
                    message: "tool raised".to_string(),
                });
            }
            Ok(json!({"scope": scope.as_str(), "tool": name, "echo": arguments}))
        }
    }

    fn resolver(registry: MockRegistry) -> (RemoteToolResolver, Arc<MockRegistry>) {
        let registry = Arc::new(registry);
        (RemoteToolResolver::new(registry.clone()), registry)
    }

    #[test]
    fn test_scope_conversions() {
        assert_eq!(RemoteScope::try_from(ToolSource::Team).unwrap(), RemoteScope::Team);
        assert_eq!(RemoteScope::try_from(ToolSource::Local), Err(ToolSource::Local));
        assert_eq!(ToolSource::from(RemoteScope::Community), ToolSource::Community);
        assert_eq!(RemoteScope::Community.to_string(), "community");
    }

    #[test]
    fn test_scope_for_local_declaration_is_unknown_source() {
        let err = RemoteScope::for_declaration(&ToolDeclaration::local("csv", "csv.yaml")).unwrap_err();
        match err {
            KgentikError::UnknownSource { name, origin } => {
                assert_eq!(name, "csv");
                assert_eq!(origin, "local");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_metadata_schema_defaults() {
        let meta: ToolMetadata = serde_json::from_str(r#"{"name": "summarize", "description": "Summarize"}"#).unwrap();
        assert_eq!(meta.input_schema, ToolDefinition::empty_schema());
        assert!(meta.version.is_none());
    }

    #[tokio::test]
    async fn test_fetch_caches_per_key() {
        let (remote, registry) = resolver(
            MockRegistry::default().with_tool(RemoteScope::Team, ToolMetadata::new("summarize", "Summarize text")),
        );
        let mut cache = ToolCache::default();

        let first = remote.fetch(RemoteScope::Team, "summarize", &mut cache).await.unwrap();
        let second = remote.fetch(RemoteScope::Team, "summarize", &mut cache).await.unwrap();

        assert_eq!(registry.fetch_count(), 1);
        assert_eq!(first, second);
        assert_eq!(first.source(), ToolSource::Team);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_scopes_are_separate_keys() {
        let (remote, registry) = resolver(
            MockRegistry::default()
                .with_tool(RemoteScope::Team, ToolMetadata::new("search", "Team search"))
                .with_tool(RemoteScope::Community, ToolMetadata::new("search", "Community search")),
        );
        let mut cache = ToolCache::default();

        let team = remote.fetch(RemoteScope::Team, "search", &mut cache).await.unwrap();
        let community = remote.fetch(RemoteScope::Community, "search", &mut cache).await.unwrap();

        assert_eq!(registry.fetch_count(), 2);
        assert_eq!(team.description(), "Team search");
        assert_eq!(community.description(), "Community search");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let (remote, _) = resolver(MockRegistry::default());
        let mut cache = ToolCache::default();

        let err = remote
            .fetch(RemoteScope::Community, "web-scraper", &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KgentikError::ToolNotFound {
                ref name,
                origin: ToolSource::Community
            } if name == "web-scraper"
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let (remote, _) = resolver(MockRegistry::unreachable());
        let mut cache = ToolCache::default();

        let err = remote.fetch(RemoteScope::Team, "summarize", &mut cache).await.unwrap_err();
        match err {
            KgentikError::RemoteFetchFailed { name, origin, reason } => {
                assert_eq!(name, "summarize");
                assert_eq!(origin, ToolSource::Team);
                assert!(reason.contains("503"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_remote_tool_forwards_invocation() {
        let (remote, _) = resolver(
            MockRegistry::default().with_tool(RemoteScope::Team, ToolMetadata::new("summarize", "Summarize text")),
        );
        let mut cache = ToolCache::default();
        let handle = remote.fetch(RemoteScope::Team, "summarize", &mut cache).await.unwrap();

        let out = handle.invoke(json!({"text": "long"})).await.unwrap();
        assert_eq!(out["scope"], "team");
        assert_eq!(out["tool"], "summarize");
        assert_eq!(out["echo"]["text"], "long");
    }

    #[tokio::test]
    async fn test_remote_tool_failure_is_execution_error() {
        let tool = RemoteTool::new(
            RemoteScope::Community,
            ToolMetadata::new("flaky", "Fails on demand"),
            Arc::new(MockRegistry::default()),
        );

        let err = tool.invoke(json!({"fail": true})).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }

    #[tokio::test]
    async fn test_resolve_uses_context_cache() {
        let (remote, registry) = resolver(
            MockRegistry::default().with_tool(RemoteScope::Community, ToolMetadata::new("web-scraper", "Scrape")),
        );
        let mut ctx = ResolutionContext::new("/proj");
        let declaration = ToolDeclaration::remote("web-scraper", ToolSource::Community);

        remote.resolve(&declaration, &mut ctx).await.unwrap();
        remote.resolve(&declaration, &mut ctx).await.unwrap();

        assert_eq!(registry.fetch_count(), 1);
        assert!(ctx.cache().contains(RemoteScope::Community, "web-scraper"));
    }
}
