use crate::path::NodePath;
use crudiff_common::{DescendPolicy, NodeKind};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::debug;

/// An object or array node found while walking a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathInfo {
    pub path: NodePath,
    pub kind: NodeKind,
    /// `false` for array elements that are objects; their array handles them
    pub processable: bool,
}

impl PathInfo {
    fn new(path: NodePath, kind: NodeKind) -> Self {
        let processable = !(kind == NodeKind::Object && path.ends_with_index());
        Self {
            path,
            kind,
            processable,
        }
    }
}

/// Every object/array node of `value` in pre-order
pub fn enumerate(value: &JsonValue, policy: DescendPolicy) -> Vec<PathInfo> {
    let mut paths = Vec::new();
    collect(value, NodePath::root(), policy, &mut paths);
    paths
}

/// Paths of `original` followed by those found only in `modified`
pub fn unified_paths(
    original: &JsonValue,
    modified: &JsonValue,
    policy: DescendPolicy,
) -> Vec<PathInfo> {
    let mut paths = enumerate(original, policy);
    let mut seen: HashSet<String> = paths.iter().map(|info| info.path.to_string()).collect();
    let original_count = paths.len();

    for info in enumerate(modified, policy) {
        if seen.insert(info.path.to_string()) {
            paths.push(info);
        }
    }

    debug!(
        "Enumerated {} paths ({} from original, {} modified-only)",
        paths.len(),
        original_count,
        paths.len() - original_count
    );
    paths
}

fn collect(value: &JsonValue, path: NodePath, policy: DescendPolicy, out: &mut Vec<PathInfo>) {
    match value {
        JsonValue::Array(items) => {
            out.push(PathInfo::new(path.clone(), NodeKind::Array));
            for (index, item) in items.iter().enumerate() {
                if is_container(item) && should_descend(item, policy) {
                    collect(item, path.index(index), policy, out);
                }
            }
        }
        JsonValue::Object(map) => {
            out.push(PathInfo::new(path.clone(), NodeKind::Object));
            for (key, child) in map {
                if is_container(child) {
                    collect(child, path.key(key.as_str()), policy, out);
                }
            }
        }
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {}
    }
}

fn should_descend(element: &JsonValue, policy: DescendPolicy) -> bool {
    match policy {
        DescendPolicy::Always => true,
        DescendPolicy::NestedOnly => match element {
            JsonValue::Object(map) => map.values().any(is_container),
            JsonValue::Array(items) => items.iter().any(is_container),
            _ => false,
        },
    }
}

pub(crate) fn is_container(value: &JsonValue) -> bool {
    matches!(value, JsonValue::Object(_) | JsonValue::Array(_))
}
