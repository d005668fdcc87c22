//! Per-pass cache of remote tool handles

use std::collections::HashMap;

use super::RemoteScope;
use crate::tools::ToolHandle;

/// Write-once map of fetched remote tools keyed by `(scope, name)`.
///
/// Once a key holds a handle, later inserts for the same key are ignored.
#[derive(Debug, Clone, Default)]
pub struct ToolCache {
    entries: HashMap<(RemoteScope, String), ToolHandle>,
}

impl ToolCache {
    pub fn get(&self, scope: RemoteScope, name: &str) -> Option<&ToolHandle> {
        self.entries.get(&(scope, name.to_string()))
    }

    /// Store `handle` unless the key is already cached; returns the cached handle
    pub fn insert(&mut self, scope: RemoteScope, name: &str, handle: ToolHandle) -> &ToolHandle {
        self.entries.entry((scope, name.to_string())).or_insert(handle)
    }

    pub fn contains(&self, scope: RemoteScope, name: &str) -> bool {
        self.get(scope, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
