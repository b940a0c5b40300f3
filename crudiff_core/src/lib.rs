pub mod cascade;
pub mod engine;
pub mod enumerate;
pub mod loader;
pub mod path;
pub mod processor;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod shallow;
pub mod tagged;

#[cfg(test)]
mod tests_vehicle;

pub use engine::{compare_objects, CompareEngine};
pub use enumerate::{enumerate, unified_paths, PathInfo};
pub use loader::{is_json_file, is_toml_file, is_yaml_file, load_document, load_match_on};
pub use path::{get_by_path, NodePath, Segment};
pub use report::{ChangeEntry, ChangeReport, OpSummary};
pub use resolver::MatchResolver;
pub use shallow::{shallow_diff, ChangeKind, ValueChange};
pub use tagged::TaggedValue;
