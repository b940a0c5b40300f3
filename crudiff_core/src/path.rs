use crudiff_common::CrudiffError;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Token used when rendering the root path
pub const ROOT_TOKEN: &str = "(root)";

/// One step of a [`NodePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Address of a node inside a value tree
///
/// Renders as dotted keys and bracketed indices, e.g.
/// `maintenance[0].parts[1].price`. The root renders as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted/bracketed path. `""` and `(root)` denote the root.
    pub fn parse(input: &str) -> Result<Self, CrudiffError> {
        if input.is_empty() || input == ROOT_TOKEN {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = input.chars().peekable();
        // Set after `]` so that `a[0].b` and `a[0][1]` parse but `a[0]b` does not
        let mut after_index = false;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(malformed(input, "empty key"));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    if chars.peek().is_none() {
                        return Err(malformed(input, "trailing '.'"));
                    }
                    after_index = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(malformed(input, "non-numeric index")),
                            None => return Err(malformed(input, "unclosed '['")),
                        }
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| malformed(input, "invalid index"))?;
                    segments.push(Segment::Index(index));
                    after_index = true;
                }
                ']' => return Err(malformed(input, "unexpected ']'")),
                other => {
                    if after_index {
                        return Err(malformed(input, "missing '.' after index"));
                    }
                    key.push(other);
                }
            }
        }

        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// `self` followed by the segments of `relative`
    pub fn join(&self, relative: &NodePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(relative.segments.iter().cloned());
        Self { segments }
    }

    /// True when `ancestor` is a strict prefix of `self`
    pub fn is_descendant_of(&self, ancestor: &NodePath) -> bool {
        self.segments.len() > ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }

    /// True when the path addresses an array element directly (`...[n]`)
    pub fn ends_with_index(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Index(_)))
    }

    /// Object keys only, with every index segment stripped
    pub fn normalized_keys(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Key(key) => Some(key.as_str()),
                Segment::Index(_) => None,
            })
            .collect()
    }

    /// Dotted form of [`normalized_keys`](Self::normalized_keys), e.g. `maintenance.parts`
    pub fn normalized(&self) -> String {
        self.normalized_keys().join(".")
    }

    /// Render without the root token; the root renders as `""`
    pub fn to_path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(ROOT_TOKEN)
        } else {
            f.write_str(&self.to_path_string())
        }
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn malformed(input: &str, reason: &str) -> CrudiffError {
    CrudiffError::Path(format!("{}: {}", reason, input))
}

/// Resolve `path` inside a JSON value; missing steps yield `None`
pub fn get<'a>(root: &'a JsonValue, path: &NodePath) -> Option<&'a JsonValue> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| match (segment, node) {
            (Segment::Key(key), JsonValue::Object(map)) => map.get(key),
            (Segment::Index(index), JsonValue::Array(items)) => items.get(*index),
            _ => None,
        })
}

/// String form of [`get`]; malformed paths resolve to `None`
pub fn get_by_path<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = NodePath::parse(path).ok()?;
    get(root, &path)
}
