use crate::enumerate::{unified_paths, PathInfo};
use crate::loader::load_document;
use crate::processor::PathProcessor;
use crate::resolver::MatchResolver;
use crate::tagged::TaggedValue;
use crudiff_common::{AppConfig, ArrayFallback, CrudiffError, DescendPolicy, MatchOnMap};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::{debug, info};

/// Engine annotating a modified value with per-node CRUD operations
#[derive(Debug, Clone, Default)]
pub struct CompareEngine {
    match_on: MatchOnMap,
    descend_policy: DescendPolicy,
    array_fallback: ArrayFallback,
}

impl CompareEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            match_on: config.match_on.clone(),
            descend_policy: config.descend_policy,
            array_fallback: config.array_fallback,
        }
    }

    pub fn with_match_on(mut self, match_on: MatchOnMap) -> Self {
        self.match_on = match_on;
        self
    }

    pub fn with_descend_policy(mut self, policy: DescendPolicy) -> Self {
        self.descend_policy = policy;
        self
    }

    pub fn with_array_fallback(mut self, fallback: ArrayFallback) -> Self {
        self.array_fallback = fallback;
        self
    }

    /// Unified path list the comparison walks
    pub fn paths(&self, original: &JsonValue, modified: &JsonValue) -> Vec<PathInfo> {
        unified_paths(original, modified, self.descend_policy)
    }

    /// Compare two values; the result is a tagged copy of `modified`
    pub fn compare(&self, original: &JsonValue, modified: &JsonValue) -> TaggedValue {
        let mut result = TaggedValue::from(modified);
        let paths = self.paths(original, modified);
        let mut processor = PathProcessor::new(
            original,
            modified,
            MatchResolver::new(&self.match_on),
            self.descend_policy,
            self.array_fallback,
        );

        for info in &paths {
            processor.process(info, &mut result);
        }

        debug!("Processed {} paths", paths.len());
        result
    }

    /// Load two JSON/YAML documents and compare them
    pub fn compare_files(
        &self,
        original: &Path,
        modified: &Path,
    ) -> Result<TaggedValue, CrudiffError> {
        info!("Comparing {} with {}", original.display(), modified.display());
        let original = load_document(original)?;
        let modified = load_document(modified)?;
        Ok(self.compare(&original, &modified))
    }
}

/// Compare `original` with `modified` using default options
pub fn compare_objects(
    original: &JsonValue,
    modified: &JsonValue,
    match_on: &MatchOnMap,
) -> TaggedValue {
    CompareEngine::new()
        .with_match_on(match_on.clone())
        .compare(original, modified)
}
