//! Opaque rows and field paths.
//!
//! The grid and the comparator library never assume a concrete row shape.
//! They reach into rows only through the [`FieldPath`]s they are handed,
//! using the [`Record`] trait.
//!
//! # Path-Based Access
//!
//! Paths can use either "." or "/" as separators. All-digit segments address
//! sequence elements:
//!
//! ```
//! use serde_json::json;
//! use trellis::model::{FieldPath, Record};
//!
//! let machine = json!({
//!     "name": "node-1",
//!     "assignments": [{ "user": { "username": "alice" } }],
//! });
//!
//! let path = FieldPath::parse("assignments.0.user.username");
//! assert_eq!(machine.lookup(&path), Some(&json!("alice")));
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member name.
    Key(String),
    /// Sequence position.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An ordered sequence of keys and indices leading into a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Creates a path from explicit segments.
    pub fn new(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Parses a dotted (or slash separated) path string.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split(['.', '/'])
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(index) if s.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(index),
                _ => PathSegment::Key(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// The path's segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns true for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a segment, returning the extended path.
    pub fn join(mut self, segment: impl Into<PathSegment>) -> Self {
        self.segments.push(segment.into());
        self
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath::parse(&path)
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(path: &FieldPath) -> Self {
        path.clone()
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        FieldPath { segments }
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// A row the grid can search, sort and render.
///
/// Only `field` is required. Rows whose data is not JSON-shaped can still
/// implement it by keeping their searchable columns as [`Value`]s.
pub trait Record: Send + Sync {
    /// Returns the top-level member `key`, if present.
    fn field(&self, key: &str) -> Option<&Value>;

    /// Returns every top-level value, used when a search has no key paths.
    fn top_level_values(&self) -> Vec<&Value>;

    /// Follows `path` into the row. Any missing step yields `None`.
    fn lookup(&self, path: &FieldPath) -> Option<&Value> {
        match path.segments().split_first() {
            Some((PathSegment::Key(key), rest)) => walk(self.field(key)?, rest),
            _ => None,
        }
    }

    /// Collects every value reachable through `path`, fanning out over
    /// sequences met along the way.
    ///
    /// `"interfaces.mac"` yields the `mac` of each interface.
    fn collect<'a>(&'a self, path: &FieldPath, out: &mut Vec<&'a Value>) {
        if let Some((PathSegment::Key(key), rest)) = path.segments().split_first()
            && let Some(value) = self.field(key)
        {
            fan_out(value, rest, out);
        }
    }
}

impl Record for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }

    fn top_level_values(&self) -> Vec<&Value> {
        match self {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }

    fn lookup(&self, path: &FieldPath) -> Option<&Value> {
        walk(self, path.segments())
    }

    fn collect<'a>(&'a self, path: &FieldPath, out: &mut Vec<&'a Value>) {
        fan_out(self, path.segments(), out);
    }
}

impl Record for Map<String, Value> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn top_level_values(&self) -> Vec<&Value> {
        self.values().collect()
    }
}

fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn walk<'a>(mut value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    for segment in segments {
        value = step(value, segment)?;
    }
    Some(value)
}

fn fan_out<'a>(value: &'a Value, segments: &[PathSegment], out: &mut Vec<&'a Value>) {
    match (value, segments.split_first()) {
        (Value::Array(items), None) => {
            for item in items {
                fan_out(item, segments, out);
            }
        }
        (Value::Null, None) => {}
        (leaf, None) => out.push(leaf),
        (Value::Array(items), Some((PathSegment::Key(_), _))) => {
            for item in items {
                fan_out(item, segments, out);
            }
        }
        (value, Some((segment, rest))) => {
            if let Some(next) = step(value, segment) {
                fan_out(next, rest, out);
            }
        }
    }
}

/// Collects every scalar leaf under `value`, depth first.
pub fn leaf_values<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| leaf_values(v, out)),
        Value::Array(items) => items.iter().for_each(|v| leaf_values(v, out)),
        Value::Null => {}
        leaf => out.push(leaf),
    }
}

/// Renders a scalar value as text. Containers and null yield `None`.
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn machine() -> Value {
        json!({
            "name": "node-1",
            "bmc": { "name": "bmc-1", "ip": "10.0.0.1" },
            "interfaces": [
                { "mac": "aa:bb:cc:dd:ee:01" },
                { "mac": "aa:bb:cc:dd:ee:02" },
            ],
            "assignments": [],
        })
    }

    #[test]
    fn test_parse_paths() {
        let path = FieldPath::parse("assignments.0.user/username");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("assignments".into()),
                PathSegment::Index(0),
                PathSegment::Key("user".into()),
                PathSegment::Key("username".into()),
            ]
        );
        assert_eq!(path.to_string(), "assignments.0.user.username");
        assert!(FieldPath::parse("").is_empty());
    }

    #[test]
    fn test_lookup_nested_and_missing() {
        let row = machine();
        assert_eq!(row.lookup(&"bmc.ip".into()), Some(&json!("10.0.0.1")));
        assert_eq!(row.lookup(&"interfaces.1.mac".into()), Some(&json!("aa:bb:cc:dd:ee:02")));
        assert_eq!(row.lookup(&"assignments.0.user".into()), None);
        assert_eq!(row.lookup(&"bmc.name.first".into()), None);
    }

    #[test]
    fn test_collect_fans_out_over_arrays() {
        let row = machine();
        let mut out = Vec::new();
        row.collect(&"interfaces.mac".into(), &mut out);
        assert_eq!(out, vec![&json!("aa:bb:cc:dd:ee:01"), &json!("aa:bb:cc:dd:ee:02")]);

        let mut out = Vec::new();
        row.collect(&"assignments.reason".into(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_map_record_uses_first_key() {
        let Value::Object(map) = machine() else {
            unreachable!()
        };
        assert_eq!(map.lookup(&"bmc.name".into()), Some(&json!("bmc-1")));
        assert_eq!(map.lookup(&FieldPath::new([PathSegment::Index(0)])), None);
    }

    #[test]
    fn test_path_serde_as_string() {
        let path: FieldPath = serde_json::from_str("\"bmc.name\"").unwrap();
        assert_eq!(path, FieldPath::new(["bmc".into(), "name".into()]));
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"bmc.name\"");
    }
}
