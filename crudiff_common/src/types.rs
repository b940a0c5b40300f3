use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::CrudiffError;

/// Operation that turned the original node into the modified one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudOperation {
    /// Node exists only in the modified value
    Insert,
    /// Node exists on both sides and differs
    Update,
    /// Node exists only in the original value
    Delete,
    /// Node exists on both sides unchanged
    None,
}

impl CrudOperation {
    pub const ALL: [CrudOperation; 4] = [
        CrudOperation::Insert,
        CrudOperation::Update,
        CrudOperation::Delete,
        CrudOperation::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::Insert => "insert",
            CrudOperation::Update => "update",
            CrudOperation::Delete => "delete",
            CrudOperation::None => "none",
        }
    }

    /// `update` when a diff found changes, `none` otherwise
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            CrudOperation::Update
        } else {
            CrudOperation::None
        }
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrudOperation {
    type Err = CrudiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insert" => Ok(CrudOperation::Insert),
            "update" => Ok(CrudOperation::Update),
            "delete" => Ok(CrudOperation::Delete),
            "none" => Ok(CrudOperation::None),
            other => Err(CrudiffError::Parse(format!("unknown operation: {}", other))),
        }
    }
}

/// Kind of container found at an enumerated path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Object,
    Array,
}

/// Which array elements the path enumerator descends into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescendPolicy {
    /// Descend into every object/array element
    #[default]
    Always,
    /// Descend only into elements that hold at least one nested object/array
    NestedOnly,
}

/// How arrays of objects without identity fields are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayFallback {
    /// Pair elements by position and tag each element
    #[default]
    IndexPaired,
    /// Diff the array as one unit and tag the array itself
    Whole,
}

/// Identity configuration keyed by array name or normalized path
pub type MatchOnMap = BTreeMap<String, MatchOnValue>;

/// One entry of a [`MatchOnMap`]
///
/// Entries that are neither a list of field names nor an object
/// deserialize into `Inert` and never resolve to identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchOnValue {
    Fields(Vec<String>),
    Node(MatchOnNode),
    Inert(serde_json::Value),
}

/// Hierarchical identity configuration for nested arrays
///
/// Nested arrays are configured either as direct keys of the node or under
/// `children`; direct keys are looked up first. A malformed `matchOn` or
/// `children` is dropped on its own without discarding the rest of the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchOnNode {
    #[serde(
        rename = "matchOn",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub match_on: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub children: Option<MatchOnMap>,
    #[serde(flatten)]
    pub direct: MatchOnMap,
}

impl MatchOnNode {
    /// Entry configured for the nested array `key`
    pub fn child(&self, key: &str) -> Option<&MatchOnValue> {
        self.direct
            .get(key)
            .or_else(|| self.children.as_ref().and_then(|children| children.get(key)))
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl MatchOnValue {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchOnValue::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn node(match_on: Option<Vec<String>>, children: Option<MatchOnMap>) -> Self {
        MatchOnValue::Node(MatchOnNode {
            match_on,
            children,
            direct: MatchOnMap::new(),
        })
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Array element descent policy used while enumerating paths
    #[serde(default)]
    pub descend_policy: DescendPolicy,

    /// Comparison mode for object arrays without identity fields
    #[serde(default)]
    pub array_fallback: ArrayFallback,

    /// Identity fields per array
    #[serde(default)]
    pub match_on: MatchOnMap,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}
