//! Nested path addressing for schema-less records.
//!
//! A `FieldPath` names a location inside a `serde_json::Value` tree,
//! either as a single key, a dotted string (`"androidInfo.manualInfo.alias"`)
//! or an explicit segment list. Dotted and segment forms are interchangeable.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("field path is empty")]
    Empty,
    #[error("missing segment `{segment}` in `{path}`")]
    MissingSegment { path: String, segment: String },
    #[error("segment `{segment}` in `{path}` is not an object")]
    NotAnObject { path: String, segment: String },
}

/// Location of one field inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a path from explicit segments: `FieldPath::new(["androidInfo", "manualInfo", "alias"])`.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the dotted form. A plain key parses to a single-segment path.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Dotted form, also used as the error/message key for a field.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    /// Extend the path with one more segment (keyPrefix pattern).
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Read the value at this path, `None` when any segment is absent.
    pub fn get<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = current.as_object()?.get(segment)?;
        }
        if self.segments.is_empty() {
            None
        } else {
            Some(current)
        }
    }

    /// Read the value at this path, erroring on the first absent segment.
    pub fn get_strict<'a>(&self, record: &'a Value) -> Result<&'a Value, PathError> {
        if self.segments.is_empty() {
            return Err(PathError::Empty);
        }
        let mut current = record;
        for segment in &self.segments {
            let obj = current
                .as_object()
                .ok_or_else(|| PathError::NotAnObject {
                    path: self.dotted(),
                    segment: segment.clone(),
                })?;
            current = obj.get(segment).ok_or_else(|| PathError::MissingSegment {
                path: self.dotted(),
                segment: segment.clone(),
            })?;
        }
        Ok(current)
    }

    /// Write `value` at this path, creating intermediate objects as needed.
    ///
    /// Fails when an intermediate segment exists but is not an object
    /// (writing "a.b" into `{"a": 1}`).
    pub fn set(&self, record: &mut Value, value: Value) -> Result<(), PathError> {
        let (last, parents) = self.segments.split_last().ok_or(PathError::Empty)?;
        let mut current = record;
        for segment in parents {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            let obj = current
                .as_object_mut()
                .ok_or_else(|| PathError::NotAnObject {
                    path: self.dotted(),
                    segment: segment.clone(),
                })?;
            current = obj
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let obj = current
            .as_object_mut()
            .ok_or_else(|| PathError::NotAnObject {
                path: self.dotted(),
                segment: last.clone(),
            })?;
        obj.insert(last.clone(), value);
        Ok(())
    }

    /// Remove the value at this path, returning it when present.
    /// Missing segments are a no-op (used for linked-field resets).
    pub fn remove(&self, record: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current.as_object_mut()?.remove(last)
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dotted_and_segment_forms_are_interchangeable() {
        assert_eq!(
            FieldPath::parse("androidInfo.manualInfo.alias"),
            FieldPath::new(["androidInfo", "manualInfo", "alias"])
        );
        assert_eq!(FieldPath::parse("name").segments(), ["name".to_string()]);
    }

    #[test]
    fn test_get_nested() {
        let record = json!({"androidInfo": {"manualInfo": {"alias": "key0"}}});
        let path = FieldPath::parse("androidInfo.manualInfo.alias");
        assert_eq!(path.get(&record), Some(&json!("key0")));
        assert_eq!(FieldPath::parse("androidInfo.autoInfo").get(&record), None);
    }

    #[test]
    fn test_get_strict_reports_missing_segment() {
        let record = json!({"androidInfo": {}});
        let err = FieldPath::parse("androidInfo.manualInfo.alias")
            .get_strict(&record)
            .unwrap_err();
        assert_eq!(
            err,
            PathError::MissingSegment {
                path: "androidInfo.manualInfo.alias".into(),
                segment: "manualInfo".into(),
            }
        );
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut record = json!({});
        FieldPath::parse("iosInfo.keyChainP12.uuid")
            .set(&mut record, json!("abc"))
            .unwrap();
        assert_eq!(record, json!({"iosInfo": {"keyChainP12": {"uuid": "abc"}}}));
    }

    #[test]
    fn test_set_into_null_root() {
        let mut record = Value::Null;
        FieldPath::parse("name").set(&mut record, json!("x")).unwrap();
        assert_eq!(record, json!({"name": "x"}));
    }

    #[test]
    fn test_set_rejects_scalar_intermediate() {
        let mut record = json!({"a": 1});
        let err = FieldPath::parse("a.b").set(&mut record, json!(2)).unwrap_err();
        assert!(matches!(err, PathError::NotAnObject { .. }));
    }

    #[test]
    fn test_remove_is_lenient() {
        let mut record = json!({"iosInfo": {"keyChainP12": {"password": "s3cret"}}});
        let removed = FieldPath::parse("iosInfo.keyChainP12.password").remove(&mut record);
        assert_eq!(removed, Some(json!("s3cret")));
        assert_eq!(
            FieldPath::parse("iosInfo.keyChainP12.password").remove(&mut record),
            None
        );
    }

    #[test]
    fn test_empty_path_errors() {
        let mut record = json!({});
        assert_eq!(
            FieldPath::new(Vec::<String>::new()).set(&mut record, json!(1)),
            Err(PathError::Empty)
        );
    }
}
