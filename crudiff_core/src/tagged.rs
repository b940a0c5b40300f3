//! Result tree carrying one operation tag per object/array node.

use crate::path::{NodePath, Segment};
use crudiff_common::CrudOperation;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value as JsonValue};

/// Property name used for operation tags when rendering to JSON
pub const OP_KEY: &str = "_op";

/// Property holding the elements of a tagged array when rendering to JSON
pub const ITEMS_KEY: &str = "_items";

/// A JSON value whose containers may carry a [`CrudOperation`]
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array {
        items: Vec<TaggedValue>,
        op: Option<CrudOperation>,
    },
    Object {
        fields: IndexMap<String, TaggedValue>,
        op: Option<CrudOperation>,
    },
}

impl TaggedValue {
    pub fn is_container(&self) -> bool {
        matches!(self, TaggedValue::Array { .. } | TaggedValue::Object { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TaggedValue::Object { .. })
    }

    pub fn op(&self) -> Option<CrudOperation> {
        match self {
            TaggedValue::Array { op, .. } | TaggedValue::Object { op, .. } => *op,
            _ => None,
        }
    }

    /// Tag a container; returns `false` for primitives, which never carry tags
    pub fn set_op(&mut self, new_op: CrudOperation) -> bool {
        match self {
            TaggedValue::Array { op, .. } | TaggedValue::Object { op, .. } => {
                *op = Some(new_op);
                true
            }
            _ => false,
        }
    }

    /// Tag a container unless it already carries a tag
    pub fn set_op_if_absent(&mut self, new_op: CrudOperation) {
        if let TaggedValue::Array { op, .. } | TaggedValue::Object { op, .. } = self {
            op.get_or_insert(new_op);
        }
    }

    /// Copy of `value` tagged with `op` (primitives stay untagged)
    pub fn tagged(value: &JsonValue, op: CrudOperation) -> Self {
        let mut node = Self::from(value);
        node.set_op(op);
        node
    }

    pub fn field(&self, key: &str) -> Option<&TaggedValue> {
        match self {
            TaggedValue::Object { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[TaggedValue]> {
        match self {
            TaggedValue::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn get(&self, path: &NodePath) -> Option<&TaggedValue> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (Segment::Key(key), TaggedValue::Object { fields, .. }) => fields.get(key),
                (Segment::Index(index), TaggedValue::Array { items, .. }) => items.get(*index),
                _ => None,
            })
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut TaggedValue> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (segment, node) {
                (Segment::Key(key), TaggedValue::Object { fields, .. }) => fields.get_mut(key),
                (Segment::Index(index), TaggedValue::Array { items, .. }) => {
                    items.get_mut(*index)
                }
                _ => None,
            })
    }

    /// Write `value` at `path`, creating intermediate containers as needed.
    ///
    /// Key segments create objects, index segments create arrays padded with
    /// `null`. A primitive standing in the way is replaced.
    pub fn set(&mut self, path: &NodePath, value: TaggedValue) {
        let mut node = self;
        for segment in path.segments() {
            node = node.child_or_insert(segment);
        }
        *node = value;
    }

    fn child_or_insert(&mut self, segment: &Segment) -> &mut TaggedValue {
        match segment {
            Segment::Key(key) => {
                if !self.is_object() {
                    *self = TaggedValue::Object {
                        fields: IndexMap::new(),
                        op: None,
                    };
                }
                match self {
                    TaggedValue::Object { fields, .. } => {
                        fields.entry(key.clone()).or_insert(TaggedValue::Null)
                    }
                    _ => unreachable!("replaced by an object above"),
                }
            }
            Segment::Index(index) => {
                if !matches!(self, TaggedValue::Array { .. }) {
                    *self = TaggedValue::Array {
                        items: Vec::new(),
                        op: None,
                    };
                }
                match self {
                    TaggedValue::Array { items, .. } => {
                        if items.len() <= *index {
                            items.resize(*index + 1, TaggedValue::Null);
                        }
                        &mut items[*index]
                    }
                    _ => unreachable!("replaced by an array above"),
                }
            }
        }
    }

    /// Mutable children that are themselves objects or arrays
    pub(crate) fn container_children_mut(&mut self) -> Vec<&mut TaggedValue> {
        match self {
            TaggedValue::Object { fields, .. } => fields
                .values_mut()
                .filter(|child| child.is_container())
                .collect(),
            TaggedValue::Array { items, .. } => items
                .iter_mut()
                .filter(|child| child.is_container())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Render to plain JSON, adding `_op` properties (see [`Serialize`] impl)
    pub fn into_json(self) -> JsonValue {
        match self {
            TaggedValue::Null => JsonValue::Null,
            TaggedValue::Bool(b) => JsonValue::Bool(b),
            TaggedValue::Number(n) => JsonValue::Number(n),
            TaggedValue::String(s) => JsonValue::String(s),
            TaggedValue::Array { items, op } => {
                let items = JsonValue::Array(items.into_iter().map(Self::into_json).collect());
                match op {
                    Some(op) => {
                        let mut map = serde_json::Map::new();
                        map.insert(OP_KEY.to_string(), JsonValue::String(op.to_string()));
                        map.insert(ITEMS_KEY.to_string(), items);
                        JsonValue::Object(map)
                    }
                    None => items,
                }
            }
            TaggedValue::Object { fields, op } => {
                let mut map = serde_json::Map::new();
                for (key, value) in fields {
                    if op.is_some() && key == OP_KEY {
                        continue;
                    }
                    map.insert(key, value.into_json());
                }
                if let Some(op) = op {
                    map.insert(OP_KEY.to_string(), JsonValue::String(op.to_string()));
                }
                JsonValue::Object(map)
            }
        }
    }
}

impl From<&JsonValue> for TaggedValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => TaggedValue::Null,
            JsonValue::Bool(b) => TaggedValue::Bool(*b),
            JsonValue::Number(n) => TaggedValue::Number(n.clone()),
            JsonValue::String(s) => TaggedValue::String(s.clone()),
            JsonValue::Array(items) => TaggedValue::Array {
                items: items.iter().map(TaggedValue::from).collect(),
                op: None,
            },
            JsonValue::Object(map) => TaggedValue::Object {
                fields: map
                    .iter()
                    .map(|(key, value)| (key.clone(), TaggedValue::from(value)))
                    .collect(),
                op: None,
            },
        }
    }
}

impl From<TaggedValue> for JsonValue {
    fn from(value: TaggedValue) -> Self {
        value.into_json()
    }
}

/// Objects serialize their fields followed by `"_op"` when tagged; a tagged
/// array serializes as `{"_op": ..., "_items": [...]}`, an untagged one as a
/// plain array.
impl Serialize for TaggedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TaggedValue::Null => serializer.serialize_unit(),
            TaggedValue::Bool(b) => serializer.serialize_bool(*b),
            TaggedValue::Number(n) => n.serialize(serializer),
            TaggedValue::String(s) => serializer.serialize_str(s),
            TaggedValue::Array { items, op: None } => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TaggedValue::Array {
                items,
                op: Some(op),
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(OP_KEY, op)?;
                map.serialize_entry(ITEMS_KEY, items)?;
                map.end()
            }
            TaggedValue::Object { fields, op } => {
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in fields {
                    if op.is_some() && key == OP_KEY {
                        continue;
                    }
                    map.serialize_entry(key, value)?;
                }
                if let Some(op) = op {
                    map.serialize_entry(OP_KEY, op)?;
                }
                map.end()
            }
        }
    }
}
