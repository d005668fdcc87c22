//! The resolution pipeline.
//!
//! One pass turns a validated [`Configuration`](crate::config::Configuration)
//! into a [`ToolSet`](crate::tools::ToolSet):
//!
//! ```text
//! ToolRegistry::aggregate
//!   for each declaration, in order
//!     SourceDispatcher::resolve
//!       local           -> LocalModuleLoader
//!       team|community  -> RemoteToolResolver (cached per pass)
//!   duplicate name check
//! ```

mod context;
mod dispatch;
mod registry;

pub use context::ResolutionContext;
pub use dispatch::SourceDispatcher;
pub use registry::ToolRegistry;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ToolDeclaration;
use crate::error::Result;
use crate::tools::ToolHandle;

/// Anything that can turn one declaration into a handle
#[async_trait]
pub trait ToolResolver: Send + Sync {
    async fn resolve(&self, declaration: &ToolDeclaration, ctx: &mut ResolutionContext) -> Result<ToolHandle>;
}

/// What a pass does when a declaration fails to resolve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort on the first failure
    #[default]
    FailFast,
    /// Attempt every declaration, then fail with all collected errors
    CollectAll,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::CollectAll => "collect-all",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
