use crate::path::NodePath;
use crate::tagged::TaggedValue;
use crudiff_common::CrudOperation;
use serde::Serialize;

/// Number of tagged nodes per operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpSummary {
    pub total: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub none: usize,
}

impl OpSummary {
    fn record(&mut self, op: CrudOperation) {
        self.total += 1;
        match op {
            CrudOperation::Insert => self.insert += 1,
            CrudOperation::Update => self.update += 1,
            CrudOperation::Delete => self.delete += 1,
            CrudOperation::None => self.none += 1,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.insert + self.update + self.delete > 0
    }
}

/// A tagged node of the result tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    /// Location in the result tree (deleted elements sit after surviving ones)
    pub path: NodePath,
    pub op: CrudOperation,
}

/// Flat listing of the tags in a comparison result
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeReport {
    pub summary: OpSummary,
    pub entries: Vec<ChangeEntry>,
}

impl ChangeReport {
    /// Collect tags in pre-order; `changes_only` drops `none` entries from
    /// the listing but the summary still counts them.
    pub fn from_tagged(result: &TaggedValue, changes_only: bool) -> Self {
        let mut report = ChangeReport::default();
        report.walk(result, NodePath::root(), changes_only);
        report
    }

    fn walk(&mut self, node: &TaggedValue, path: NodePath, changes_only: bool) {
        if let Some(op) = node.op() {
            self.summary.record(op);
            if !(changes_only && op == CrudOperation::None) {
                self.entries.push(ChangeEntry {
                    path: path.clone(),
                    op,
                });
            }
        }

        match node {
            TaggedValue::Object { fields, .. } => {
                for (key, child) in fields {
                    if child.is_container() {
                        self.walk(child, path.key(key.as_str()), changes_only);
                    }
                }
            }
            TaggedValue::Array { items, .. } => {
                for (index, child) in items.iter().enumerate() {
                    if child.is_container() {
                        self.walk(child, path.index(index), changes_only);
                    }
                }
            }
            _ => {}
        }
    }
}
