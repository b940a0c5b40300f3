use crate::cascade::cascade;
use crate::enumerate::is_container;
use crate::shallow::{differs, values_equal};
use crate::tagged::TaggedValue;
use crudiff_common::CrudOperation;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Reconcile two arrays by identity fields.
///
/// Elements of `modified` come first, in their order, tagged `update`/`none`
/// when matched and `insert` otherwise. Elements of `original` without a
/// counterpart follow, tagged `delete`. Unmatched elements cascade their tag
/// to their descendants.
pub fn reconcile(
    original: &[JsonValue],
    modified: &[JsonValue],
    fields: &[String],
) -> Vec<TaggedValue> {
    let mut result = Vec::with_capacity(modified.len());
    let mut inserted = 0;
    let mut deleted = 0;

    for element in modified {
        let node = match find_match(original, element, fields) {
            Some(counterpart) => {
                let op = CrudOperation::from_changed(differs(counterpart, element));
                TaggedValue::tagged(element, op)
            }
            None => {
                inserted += 1;
                wholly(element, CrudOperation::Insert)
            }
        };
        result.push(node);
    }

    for element in original {
        if find_match(modified, element, fields).is_some() {
            continue;
        }
        // Primitive elements cannot carry a tag, so there is nothing to splice back
        if !is_container(element) {
            continue;
        }
        deleted += 1;
        result.push(wholly(element, CrudOperation::Delete));
    }

    debug!(
        "Reconciled {} original / {} modified elements on {:?}: {} inserted, {} deleted",
        original.len(),
        modified.len(),
        fields,
        inserted,
        deleted
    );
    result
}

/// First element of `candidates` sharing an identity value with `element`.
///
/// Fields are tried in declared order and the first field producing a hit
/// wins. Identity values must be present on both sides and be scalars.
pub fn find_match<'a>(
    candidates: &'a [JsonValue],
    element: &JsonValue,
    fields: &[String],
) -> Option<&'a JsonValue> {
    fields.iter().find_map(|field| {
        let wanted = identity_value(element, field)?;
        candidates.iter().find(|candidate| {
            identity_value(candidate, field).map_or(false, |value| values_equal(value, wanted))
        })
    })
}

fn identity_value<'a>(element: &'a JsonValue, field: &str) -> Option<&'a JsonValue> {
    match element {
        JsonValue::Object(map) => map.get(field).filter(|value| !is_container(value)),
        _ => None,
    }
}

/// Copy of `value` tagged `op` with the tag cascaded to its descendants
pub(crate) fn wholly(value: &JsonValue, op: CrudOperation) -> TaggedValue {
    let mut node = TaggedValue::tagged(value, op);
    cascade(&mut node, op);
    node
}
