//! Resolved tool handles and the ordered collection returned to callers

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Tool, ToolDefinition, ToolError};
use crate::config::ToolSource;

/// A resolved, ready-to-invoke tool.
///
/// The handle is named after the declaration it resolved, which may differ
/// from the name the underlying tool reports. Clones share the same tool, and
/// two handles are equal only when they share it.
#[derive(Clone)]
pub struct ToolHandle {
    name: String,
    source: ToolSource,
    tool: Arc<dyn Tool>,
}

impl ToolHandle {
    pub fn new(name: impl Into<String>, source: ToolSource, tool: Arc<dyn Tool>) -> Self {
        Self {
            name: name.into(),
            source,
            tool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> ToolSource {
        self.source
    }

    pub fn description(&self) -> &str {
        self.tool.description()
    }

    pub fn input_schema(&self) -> Value {
        self.tool.input_schema()
    }

    /// The underlying tool implementation
    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name.clone(), self.tool.description()).with_schema(self.tool.input_schema())
    }

    /// Validate arguments against the input schema, then invoke the tool
    pub async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        self.definition().validate_input(&input)?;
        log::debug!("Invoking tool '{}' ({})", self.name, self.source);
        self.tool.invoke(input).await
    }
}

impl PartialEq for ToolHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source && Arc::ptr_eq(&self.tool, &other.tool)
    }
}

impl fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolHandle")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("description", &self.tool.description())
            .finish()
    }
}

/// The ordered result of a resolution pass, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSet {
    handles: Vec<ToolHandle>,
}

impl ToolSet {
    pub(crate) fn new(handles: Vec<ToolHandle>) -> Self {
        Self { handles }
    }

    pub fn get(&self, name: &str) -> Option<&ToolHandle> {
        self.handles.iter().find(|h| h.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    /// Definitions for the orchestration framework, in order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.handles.iter().map(ToolHandle::definition).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn into_vec(self) -> Vec<ToolHandle> {
        self.handles
    }
}

impl IntoIterator for ToolSet {
    type Item = ToolHandle;
    type IntoIter = std::vec::IntoIter<ToolHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

impl<'a> IntoIterator for &'a ToolSet {
    type Item = &'a ToolHandle;
    type IntoIter = std::slice::Iter<'a, ToolHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}
