use crate::tagged::TaggedValue;
use crudiff_common::CrudOperation;

/// Propagate `op` from a wholly inserted or deleted node to its descendants.
///
/// Elements of nested arrays are force-tagged, since they share the fate of
/// the node that owns the array. Nested objects keep a tag they already
/// carry. Both are descended into.
pub fn cascade(node: &mut TaggedValue, op: CrudOperation) {
    for child in node.container_children_mut() {
        match child {
            TaggedValue::Array { .. } => force_tag_elements(child, op),
            _ => {
                child.set_op_if_absent(op);
                cascade(child, op);
            }
        }
    }
}

fn force_tag_elements(array: &mut TaggedValue, op: CrudOperation) {
    if let TaggedValue::Array { items, .. } = array {
        for item in items.iter_mut() {
            match item {
                TaggedValue::Object { .. } => {
                    item.set_op(op);
                    cascade(item, op);
                }
                TaggedValue::Array { .. } => force_tag_elements(item, op),
                _ => {}
            }
        }
    }
}
