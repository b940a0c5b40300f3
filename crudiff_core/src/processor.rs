use crate::cascade::cascade;
use crate::enumerate::{is_container, unified_paths, PathInfo};
use crate::path::{self, NodePath};
use crate::reconcile::{find_match, reconcile, wholly};
use crate::resolver::MatchResolver;
use crate::shallow::differs;
use crate::tagged::TaggedValue;
use crudiff_common::{ArrayFallback, CrudOperation, DescendPolicy};
use serde_json::Value as JsonValue;
use tracing::{debug, trace, warn};

/// Classifies each enumerated path and writes its tag into the result tree
pub struct PathProcessor<'a> {
    original: &'a JsonValue,
    modified: &'a JsonValue,
    resolver: MatchResolver<'a>,
    descend_policy: DescendPolicy,
    array_fallback: ArrayFallback,
    /// Location of `original`/`modified` inside the compared documents
    prefix: NodePath,
    /// Arrays reconciled by identity; paths below them are left to
    /// [`compare_matched`](Self::compare_matched)
    reconciled: Vec<NodePath>,
}

impl<'a> PathProcessor<'a> {
    pub fn new(
        original: &'a JsonValue,
        modified: &'a JsonValue,
        resolver: MatchResolver<'a>,
        descend_policy: DescendPolicy,
        array_fallback: ArrayFallback,
    ) -> Self {
        Self {
            original,
            modified,
            resolver,
            descend_policy,
            array_fallback,
            prefix: NodePath::root(),
            reconciled: Vec::new(),
        }
    }

    pub fn process(&mut self, info: &PathInfo, result: &mut TaggedValue) {
        if !info.processable {
            trace!("Skipping {} (handled by its array)", self.located(&info.path));
            return;
        }
        if self
            .reconciled
            .iter()
            .any(|array| info.path.is_descendant_of(array))
        {
            trace!("Skipping {} (compared by identity)", self.located(&info.path));
            return;
        }

        let path = &info.path;
        let original = path::get(self.original, path);
        let modified = path::get(self.modified, path);

        match (original, modified) {
            (None, None) => {}
            (None, Some(_)) => self.mark_inserted(path, result),
            (Some(original), None) => self.mark_deleted(path, original, result),
            (Some(JsonValue::Array(original)), Some(JsonValue::Array(modified))) => {
                self.process_array(path, original, modified, result)
            }
            (Some(original), Some(modified)) => {
                let op = CrudOperation::from_changed(differs(original, modified));
                trace!("{} -> {}", self.located(path), op);
                tag_at(result, path, op);
            }
        }
    }

    /// `path` as addressed from the roots of the compared documents
    fn located(&self, path: &NodePath) -> NodePath {
        self.prefix.join(path)
    }

    fn mark_inserted(&self, path: &NodePath, result: &mut TaggedValue) {
        if within_cascade(result, path, CrudOperation::Insert) {
            trace!("{} already inserted with its parent", self.located(path));
            return;
        }
        trace!("{} -> insert", self.located(path));
        if let Some(node) = result.get_mut(path) {
            if node.set_op(CrudOperation::Insert) {
                cascade(node, CrudOperation::Insert);
            }
        }
    }

    fn mark_deleted(&self, path: &NodePath, original: &JsonValue, result: &mut TaggedValue) {
        if within_cascade(result, path, CrudOperation::Delete) {
            trace!("{} already deleted with its parent", self.located(path));
            return;
        }
        trace!("{} -> delete", self.located(path));
        if let Some(node) = result.get_mut(path) {
            if node.set_op(CrudOperation::Delete) {
                cascade(node, CrudOperation::Delete);
            }
            return;
        }

        // Splice the vanished subtree back in, under a parent that survived
        let parent_exists = path
            .parent()
            .map_or(false, |parent| result.get(&parent).map_or(false, TaggedValue::is_container));
        if parent_exists && is_container(original) {
            result.set(path, wholly(original, CrudOperation::Delete));
        } else {
            debug!(
                "No surviving parent for deleted node {}; not spliced",
                self.located(path)
            );
        }
    }

    fn process_array(
        &mut self,
        path: &NodePath,
        original: &'a [JsonValue],
        modified: &'a [JsonValue],
        result: &mut TaggedValue,
    ) {
        let located = self.located(path);
        let fields = self.resolver.resolve(&located);

        if holds_primitives(original, modified) {
            self.tag_whole_array(path, original, modified, result);
            return;
        }

        match (fields, self.array_fallback) {
            (Some(fields), _) => {
                let items = reconcile(original, modified, fields);
                result.set(path, TaggedValue::Array { items, op: None });
                self.compare_matched(path, original, modified, fields, result);
                self.reconciled.push(path.clone());
            }
            (None, ArrayFallback::Whole) => self.tag_whole_array(path, original, modified, result),
            (None, ArrayFallback::IndexPaired) => {
                warn!(
                    "Array {} compared by position; configure match fields for \"{}\" to compare by identity",
                    located,
                    located.normalized()
                );
                let items = pair_by_index(original, modified);
                result.set(path, TaggedValue::Array { items, op: None });
            }
        }
    }

    /// Compare the nested containers of each identity-matched element
    /// against its counterpart rather than against the element at the same
    /// position.
    fn compare_matched(
        &self,
        path: &NodePath,
        original: &'a [JsonValue],
        modified: &'a [JsonValue],
        fields: &[String],
        result: &mut TaggedValue,
    ) {
        // Reconciled items start with the modified elements, in order
        for (index, element) in modified.iter().enumerate() {
            let counterpart = match find_match(original, element, fields) {
                Some(counterpart) => counterpart,
                None => continue,
            };
            let element_path = path.index(index);
            let node = match result.get_mut(&element_path) {
                Some(node) => node,
                None => continue,
            };

            let mut nested = PathProcessor {
                original: counterpart,
                modified: element,
                resolver: self.resolver,
                descend_policy: self.descend_policy,
                array_fallback: self.array_fallback,
                prefix: self.located(&element_path),
                reconciled: Vec::new(),
            };
            for info in unified_paths(counterpart, element, self.descend_policy) {
                if !info.path.is_root() {
                    nested.process(&info, node);
                }
            }
        }
    }

    fn tag_whole_array(
        &self,
        path: &NodePath,
        original: &[JsonValue],
        modified: &[JsonValue],
        result: &mut TaggedValue,
    ) {
        let changed = original.len() != modified.len()
            || original
                .iter()
                .zip(modified)
                .any(|(left, right)| differs(left, right));
        let op = CrudOperation::from_changed(changed);
        trace!("{} -> {} (whole array)", self.located(path), op);
        tag_at(result, path, op);
    }
}

/// An array holds primitives when its first element is a scalar; original is
/// inspected first, and two empty arrays count as primitive.
fn holds_primitives(original: &[JsonValue], modified: &[JsonValue]) -> bool {
    original
        .first()
        .or_else(|| modified.first())
        .map_or(true, |first| !is_container(first))
}

fn pair_by_index(original: &[JsonValue], modified: &[JsonValue]) -> Vec<TaggedValue> {
    (0..original.len().max(modified.len()))
        .filter_map(|index| match (original.get(index), modified.get(index)) {
            (Some(before), Some(after)) => Some(TaggedValue::tagged(
                after,
                CrudOperation::from_changed(differs(before, after)),
            )),
            (None, Some(after)) => Some(wholly(after, CrudOperation::Insert)),
            (Some(before), None) if is_container(before) => {
                Some(wholly(before, CrudOperation::Delete))
            }
            _ => None,
        })
        .collect()
}

/// True when an ancestor of `path` already carries `op`; the cascade from
/// that ancestor has then tagged everything below it.
fn within_cascade(result: &TaggedValue, path: &NodePath, op: CrudOperation) -> bool {
    let mut ancestor = path.parent();
    while let Some(current) = ancestor {
        if result.get(&current).and_then(TaggedValue::op) == Some(op) {
            return true;
        }
        ancestor = current.parent();
    }
    false
}

fn tag_at(result: &mut TaggedValue, path: &NodePath, op: CrudOperation) {
    if let Some(node) = result.get_mut(path) {
        node.set_op(op);
    }
}
