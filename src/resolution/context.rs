use std::path::{Path, PathBuf};

use crate::error::KgentikError;
use crate::remote::ToolCache;

/// Ephemeral state for one resolution pass.
///
/// Created at the start of a pass and dropped when it ends. Never share one
/// between passes; each carries its own remote cache.
#[derive(Debug)]
pub struct ResolutionContext {
    base_dir: PathBuf,
    cache: ToolCache,
    errors: Vec<KgentikError>,
}

impl ResolutionContext {
    /// `base_dir` anchors relative local `file` paths
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: ToolCache::default(),
            errors: Vec::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ToolCache {
        &mut self.cache
    }

    pub fn record_error(&mut self, error: KgentikError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[KgentikError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Drain the accumulated errors
    pub fn take_errors(&mut self) -> Vec<KgentikError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSource;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = ResolutionContext::new("/proj");
        assert_eq!(ctx.base_dir(), Path::new("/proj"));
        assert!(ctx.cache().is_empty());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_errors_accumulate_and_drain() {
        let mut ctx = ResolutionContext::new("/proj");
        ctx.record_error(KgentikError::ToolNotFound {
            name: "a".to_string(),
            origin: ToolSource::Team,
        });
        ctx.record_error(KgentikError::ToolNotFound {
            name: "b".to_string(),
            origin: ToolSource::Community,
        });
        assert_eq!(ctx.errors().len(), 2);

        let drained = ctx.take_errors();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].tool_name(), Some("b"));
        assert!(!ctx.has_errors());
    }
}
