//! Aggregation of resolved handles into the final ordered collection

use std::collections::HashMap;
use std::sync::Arc;

use super::{FailurePolicy, ResolutionContext, ToolResolver};
use crate::config::ToolDeclaration;
use crate::error::{KgentikError, NameCollision, Result};
use crate::tools::{ToolHandle, ToolSet};

/// Resolves every declaration in order and enforces unique names
#[derive(Clone)]
pub struct ToolRegistry {
    resolver: Arc<dyn ToolResolver>,
    policy: FailurePolicy,
}

impl ToolRegistry {
    pub fn new(resolver: Arc<dyn ToolResolver>) -> Self {
        Self {
            resolver,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Resolve `declarations` in document order.
    ///
    /// Never returns a partial set: any failure fails the pass, either
    /// immediately (fail-fast) or after every declaration was attempted
    /// (collect-all). Duplicate names are checked once everything resolved.
    pub async fn aggregate(&self, declarations: &[ToolDeclaration], ctx: &mut ResolutionContext) -> Result<ToolSet> {
        let mut handles = Vec::with_capacity(declarations.len());

        for (position, declaration) in declarations.iter().enumerate() {
            match self.resolver.resolve(declaration, ctx).await {
                Ok(handle) => {
                    tracing::debug!(
                        tool = %declaration.name,
                        source = %declaration.source,
                        position,
                        "resolved"
                    );
                    handles.push(handle);
                }
                Err(e) => {
                    tracing::warn!(
                        tool = %declaration.name,
                        source = %declaration.source,
                        position,
                        error = %e,
                        "resolution failed"
                    );
                    match self.policy {
                        FailurePolicy::FailFast => return Err(e),
                        FailurePolicy::CollectAll => ctx.record_error(e),
                    }
                }
            }
        }

        if ctx.has_errors() {
            return Err(KgentikError::ResolutionFailed {
                failures: ctx.take_errors(),
            });
        }

        let collisions = find_collisions(&handles);
        if !collisions.is_empty() {
            return Err(KgentikError::DuplicateToolName { collisions });
        }

        tracing::info!(count = handles.len(), "resolved tools");
        Ok(ToolSet::new(handles))
    }
}

/// Names held by more than one handle, in first-seen order
fn find_collisions(handles: &[ToolHandle]) -> Vec<NameCollision> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<NameCollision> = Vec::new();

    for (position, handle) in handles.iter().enumerate() {
        match index.get(handle.name()) {
            Some(&group) => groups[group].positions.push(position),
            None => {
                index.insert(handle.name(), groups.len());
                groups.push(NameCollision {
                    name: handle.name().to_string(),
                    positions: vec![position],
                });
            }
        }
    }

    groups.retain(|group| group.positions.len() > 1);
    groups
}
