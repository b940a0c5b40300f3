use crudiff_common::{CrudiffError, MatchOnMap};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

/// Read a JSON or YAML document, picking the parser from the file extension
pub fn load_document(path: &Path) -> Result<JsonValue, CrudiffError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CrudiffError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;

    debug!("Loaded {} ({} bytes)", path.display(), content.len());

    if is_yaml_file(path) {
        parse_yaml(&content, path)
    } else {
        if !is_json_file(path) {
            debug!("Unrecognized extension for {}, parsing as JSON", path.display());
        }
        parse_json(&content, path)
    }
}

/// Read a match configuration from a JSON, YAML or TOML file
pub fn load_match_on(path: &Path) -> Result<MatchOnMap, CrudiffError> {
    if is_toml_file(path) {
        let content = std::fs::read_to_string(path)?;
        return toml::from_str(&content).map_err(|e| {
            CrudiffError::Parse(format!("Failed to parse {}: {}", path.display(), e))
        });
    }

    let value = load_document(path)?;
    serde_json::from_value(value).map_err(|e| {
        CrudiffError::Config(format!(
            "Match configuration in {} must be an object: {}",
            path.display(),
            e
        ))
    })
}

fn parse_json(content: &str, path: &Path) -> Result<JsonValue, CrudiffError> {
    serde_json::from_str(content).map_err(|e| {
        CrudiffError::Parse(format!("Failed to parse JSON {}: {}", path.display(), e))
    })
}

#[cfg(feature = "yaml")]
fn parse_yaml(content: &str, path: &Path) -> Result<JsonValue, CrudiffError> {
    let yaml: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
        CrudiffError::Parse(format!("Failed to parse YAML {}: {}", path.display(), e))
    })?;
    Ok(yaml_to_json(yaml))
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_content: &str, path: &Path) -> Result<JsonValue, CrudiffError> {
    Err(CrudiffError::UnsupportedFormat(format!(
        "YAML support is disabled: {}",
        path.display()
    )))
}

/// Convert YAML value to JSON value
#[cfg(feature = "yaml")]
fn yaml_to_json(yaml: serde_yml::Value) -> JsonValue {
    use serde_yml::Value as YamlValue;

    match yaml {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::Number(serde_json::Number::from(i))
            } else if let Some(u) = n.as_u64() {
                JsonValue::Number(serde_json::Number::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            } else {
                JsonValue::Null
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    YamlValue::String(key) => key,
                    YamlValue::Number(n) => n.to_string(),
                    YamlValue::Bool(b) => b.to_string(),
                    other => format!("{:?}", other),
                };
                obj.insert(key, yaml_to_json(v));
            }
            JsonValue::Object(obj)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| extensions.contains(&ext.as_str()))
}

/// Check if a file path appears to be JSON based on extension
pub fn is_json_file(path: &Path) -> bool {
    has_extension(path, &["json", "jsonc", "json5"])
}

/// Check if a file path appears to be YAML based on extension
pub fn is_yaml_file(path: &Path) -> bool {
    has_extension(path, &["yaml", "yml"])
}

/// Check if a file path appears to be TOML based on extension
pub fn is_toml_file(path: &Path) -> bool {
    has_extension(path, &["toml"])
}
