use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    inputs: TempDir,
    config: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            inputs: TempDir::new().expect("input dir"),
            config: TempDir::new().expect("config dir"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.inputs.path().join(name);
        fs::write(&path, contents).expect("write input");
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        let exe = env!("CARGO_BIN_EXE_crudiff");
        Command::new(exe)
            .args(args)
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("APPDATA", self.config.path())
            .env("HOME", self.config.path())
            .env("RUST_LOG", "error")
            .output()
            .expect("failed to run crudiff")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "command failed: {}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).expect("stdout not utf-8");
        serde_json::from_str(&stdout).expect("invalid json output")
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

const ORIGINAL: &str = r#"{
    "model": "Corolla",
    "features": ["AC", "Radio"],
    "owners": [{"id": 1, "name": "John"}, {"id": 2, "name": "Jane"}],
    "specifications": {"engine": "2.0L", "fuel": "gasoline"}
}"#;

const MODIFIED: &str = r#"{
    "model": "Corolla LE",
    "features": ["AC", "Radio", "GPS"],
    "owners": [{"id": 1, "name": "John Doe"}, {"id": 3, "name": "Bob"}],
    "specifications": {"engine": "2.0L", "fuel": "hybrid"}
}"#;

#[test]
fn compare_with_match_on_file() {
    let ws = Workspace::new();
    let original = ws.write("original.json", ORIGINAL);
    let modified = ws.write("modified.json", MODIFIED);
    let match_on = ws.write("match.json", r#"{"owners": ["id"], "features": []}"#);

    let result = ws.run_json(&[
        "compare",
        arg(&original),
        arg(&modified),
        "--match-on",
        arg(&match_on),
    ]);

    assert_eq!(result["_op"], json!("update"));
    assert_eq!(result["model"], json!("Corolla LE"));
    assert_eq!(
        result["features"],
        json!({"_op": "update", "_items": ["AC", "Radio", "GPS"]})
    );
    assert_eq!(
        result["owners"],
        json!([
            {"id": 1, "name": "John Doe", "_op": "update"},
            {"id": 3, "name": "Bob", "_op": "insert"},
            {"id": 2, "name": "Jane", "_op": "delete"}
        ])
    );
    assert_eq!(result["specifications"]["_op"], json!("update"));
}

#[test]
fn compare_preserves_key_order() {
    let ws = Workspace::new();
    let original = ws.write("original.json", ORIGINAL);
    let modified = ws.write("modified.json", MODIFIED);

    let output = ws.run(&["compare", arg(&original), arg(&modified), "--compact"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim().lines().count(), 1);
    let model = stdout.find("\"model\"").unwrap();
    let specifications = stdout.find("\"specifications\"").unwrap();
    assert!(model < specifications);
    assert!(stdout.trim_end().ends_with(r#""_op":"update"}"#));
}

#[test]
fn compare_report_changes_only() {
    let ws = Workspace::new();
    let original = ws.write("original.json", ORIGINAL);
    let modified = ws.write("modified.json", MODIFIED);
    let match_on = ws.write("match.toml", "owners = [\"id\"]\n");

    let report = ws.run_json(&[
        "compare",
        arg(&original),
        arg(&modified),
        "--match-on",
        arg(&match_on),
        "--report",
        "--changes-only",
    ]);

    assert_eq!(report["original"], json!(arg(&original)));
    assert_eq!(report["summary"]["insert"], json!(1));
    assert_eq!(report["summary"]["delete"], json!(1));

    let entries = report["entries"].as_array().expect("entries array");
    assert!(entries.iter().all(|entry| entry["op"] != json!("none")));
    assert!(entries.contains(&json!({"path": "owners[2]", "op": "delete"})));
    assert!(entries.contains(&json!({"path": "features", "op": "update"})));
}

#[test]
fn compare_yaml_against_json() {
    let ws = Workspace::new();
    let original = ws.write("original.yaml", "specifications:\n  fuel: gasoline\n");
    let modified = ws.write("modified.json", r#"{"specifications": {"fuel": "gasoline"}}"#);

    let result = ws.run_json(&["compare", arg(&original), arg(&modified)]);
    assert_eq!(result["_op"], json!("none"));
    assert_eq!(result["specifications"]["_op"], json!("none"));
}

#[test]
fn compare_whole_array_fallback_flag() {
    let ws = Workspace::new();
    let original = ws.write("original.json", r#"{"rows": [{"v": 1}]}"#);
    let modified = ws.write("modified.json", r#"{"rows": [{"v": 2}]}"#);

    let result = ws.run_json(&[
        "compare",
        arg(&original),
        arg(&modified),
        "--array-fallback",
        "whole",
    ]);
    assert_eq!(result["rows"], json!({"_op": "update", "_items": [{"v": 2}]}));
}

#[test]
fn config_file_settings_apply_to_compare() {
    let ws = Workspace::new();
    let init = ws.run_json(&["config", "--init"]);
    let config_path = PathBuf::from(init["path"].as_str().expect("config path"));
    assert!(config_path.exists());

    fs::write(
        &config_path,
        "array_fallback = \"whole\"\n\n[match_on]\nowners = [\"id\"]\n",
    )
    .unwrap();

    let shown = ws.run_json(&["config"]);
    assert_eq!(shown["config"]["array_fallback"], json!("whole"));

    let original = ws.write("original.json", ORIGINAL);
    let modified = ws.write("modified.json", MODIFIED);
    let result = ws.run_json(&["compare", arg(&original), arg(&modified)]);
    assert_eq!(result["owners"][2]["_op"], json!("delete"));

    // Command line flags win over the file
    let result = ws.run_json(&[
        "compare",
        arg(&original),
        arg(&modified),
        "--match-on",
        arg(&ws.write("empty.json", "{}")),
        "--array-fallback",
        "index-paired",
    ]);
    assert_eq!(result["owners"][1]["_op"], json!("update"));
    assert!(result["owners"].as_array().unwrap().len() == 2);
}

#[test]
fn paths_json_lists_unified_paths() {
    let ws = Workspace::new();
    let original = ws.write("original.json", r#"{"rows": [{"id": 1}], "meta": {}}"#);
    let modified = ws.write("modified.json", r#"{"rows": [], "extra": [1]}"#);

    let paths = ws.run_json(&["paths", arg(&original), arg(&modified), "--json"]);
    let listed: Vec<(&str, &str, bool)> = paths
        .as_array()
        .unwrap()
        .iter()
        .map(|info| {
            (
                info["path"].as_str().unwrap(),
                info["kind"].as_str().unwrap(),
                info["processable"].as_bool().unwrap(),
            )
        })
        .collect();

    assert_eq!(
        listed,
        vec![
            ("(root)", "object", true),
            ("rows", "array", true),
            ("rows[0]", "object", false),
            ("meta", "object", true),
            ("extra", "array", true),
        ]
    );
}

#[test]
fn missing_input_fails() {
    let ws = Workspace::new();
    let modified = ws.write("modified.json", "{}");
    let missing = ws.inputs.path().join("missing.json");

    let output = ws.run(&["compare", arg(&missing), arg(&modified)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_json_fails() {
    let ws = Workspace::new();
    let original = ws.write("original.json", "{\"open\": ");
    let modified = ws.write("modified.json", "{}");

    let output = ws.run(&["compare", arg(&original), arg(&modified)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse JSON"));
}
