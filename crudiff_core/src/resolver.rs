use crate::path::NodePath;
use crudiff_common::{MatchOnMap, MatchOnValue};
use tracing::trace;

/// Resolves the identity fields configured for an array path
#[derive(Debug, Clone, Copy)]
pub struct MatchResolver<'a> {
    map: &'a MatchOnMap,
}

impl<'a> MatchResolver<'a> {
    pub fn new(map: &'a MatchOnMap) -> Self {
        Self { map }
    }

    /// Identity fields for `path`, or `None` when the array has no identity.
    ///
    /// Index segments are ignored. A flat entry keyed by the dotted path wins;
    /// otherwise the map is walked one key at a time. Below a hierarchical
    /// node a key is looked up among the node's direct keys first, then
    /// under its `children`.
    pub fn resolve(&self, path: &NodePath) -> Option<&'a [String]> {
        let normalized = path.normalized();

        let fields = self
            .flat_lookup(&normalized)
            .or_else(|| self.hierarchical_lookup(&path.normalized_keys()))
            .filter(|fields| !fields.is_empty());

        trace!("Match fields for {}: {:?}", normalized, fields);
        fields
    }

    fn flat_lookup(&self, normalized: &str) -> Option<&'a [String]> {
        match self.map.get(normalized)? {
            MatchOnValue::Fields(fields) => Some(fields.as_slice()),
            _ => None,
        }
    }

    fn hierarchical_lookup(&self, keys: &[&str]) -> Option<&'a [String]> {
        let (first, rest) = keys.split_first()?;
        let mut current = self.map.get(*first)?;

        for key in rest {
            current = match current {
                MatchOnValue::Node(node) => node.child(key)?,
                MatchOnValue::Fields(_) | MatchOnValue::Inert(_) => return None,
            };
        }

        match current {
            MatchOnValue::Fields(fields) => Some(fields.as_slice()),
            MatchOnValue::Node(node) => node.match_on.as_deref(),
            MatchOnValue::Inert(_) => None,
        }
    }
}
