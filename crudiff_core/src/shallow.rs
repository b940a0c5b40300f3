use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

/// Position of a change relative to the compared values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChangeKey {
    /// The compared values themselves
    Root,
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the second value
    Added,
    /// Present only in the first value
    Removed,
    /// Present in both with different content
    Changed,
}

/// One first-level difference between two values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueChange {
    pub key: ChangeKey,
    pub kind: ChangeKind,
}

impl ValueChange {
    fn new(key: ChangeKey, kind: ChangeKind) -> Self {
        Self { key, kind }
    }
}

/// Compare two values one level deep.
///
/// Yields one record per immediate key or index that differs. Nested values
/// are compared deeply but a nested difference is reported once, at the
/// first-level key. Scalars and values of different kinds yield at most a
/// single [`ChangeKey::Root`] record.
pub fn shallow_diff(left: &JsonValue, right: &JsonValue) -> Vec<ValueChange> {
    match (left, right) {
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            let mut changes = Vec::new();
            for (key, a_val) in a {
                match b.get(key) {
                    None => changes.push(ValueChange::new(
                        ChangeKey::Key(key.clone()),
                        ChangeKind::Removed,
                    )),
                    Some(b_val) if !values_equal(a_val, b_val) => changes.push(
                        ValueChange::new(ChangeKey::Key(key.clone()), ChangeKind::Changed),
                    ),
                    Some(_) => {}
                }
            }
            for key in b.keys().filter(|key| !a.contains_key(*key)) {
                changes.push(ValueChange::new(
                    ChangeKey::Key(key.clone()),
                    ChangeKind::Added,
                ));
            }
            changes
        }
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            let mut changes = Vec::new();
            for index in 0..a.len().max(b.len()) {
                let kind = match (a.get(index), b.get(index)) {
                    (Some(x), Some(y)) if values_equal(x, y) => continue,
                    (Some(_), Some(_)) => ChangeKind::Changed,
                    (Some(_), None) => ChangeKind::Removed,
                    (None, Some(_)) => ChangeKind::Added,
                    (None, None) => unreachable!(),
                };
                changes.push(ValueChange::new(ChangeKey::Index(index), kind));
            }
            changes
        }
        _ if values_equal(left, right) => Vec::new(),
        _ => vec![ValueChange::new(ChangeKey::Root, ChangeKind::Changed)],
    }
}

/// `true` when [`shallow_diff`] finds at least one change
pub fn differs(left: &JsonValue, right: &JsonValue) -> bool {
    !shallow_diff(left, right).is_empty()
}

/// Deep equality; numbers compare by exact value regardless of representation
pub fn values_equal(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Null, JsonValue::Null) => true,
        (JsonValue::Bool(a), JsonValue::Bool(b)) => a == b,
        (JsonValue::Number(a), JsonValue::Number(b)) => numbers_equal(a, b),
        (JsonValue::String(a), JsonValue::String(b)) => a == b,
        (JsonValue::Array(a), JsonValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (JsonValue::Object(a), JsonValue::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| values_equal(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_f64().filter(|_| a.is_f64()), b.as_f64().filter(|_| b.is_f64())) {
        (None, None) => a.as_i64() == b.as_i64() && a.as_u64() == b.as_u64(),
        (Some(x), Some(y)) => x == y,
        (Some(float), None) => integer_equals_float(b, float),
        (None, Some(float)) => integer_equals_float(a, float),
    }
}

/// Exact comparison of an integer with a float, without rounding the integer
fn integer_equals_float(integer: &Number, float: f64) -> bool {
    // 2^63 and 2^64 are exactly representable
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;

    if float.fract() != 0.0 {
        return false;
    }
    if let Some(i) = integer.as_i64() {
        (-I64_END..I64_END).contains(&float) && float as i64 == i
    } else if let Some(u) = integer.as_u64() {
        (0.0..U64_END).contains(&float) && float as u64 == u
    } else {
        false
    }
}
