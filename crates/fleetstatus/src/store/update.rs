//! Partial document updates.
//!
//! An [`Update`] is an ordered list of dotted field paths, each mapped to
//! either a new value (set) or `None` (unset). Operations are applied in
//! insertion order, so a later entry for the same path wins.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::{Document, ID_FIELD};

/// A set/unset update applied to a single document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(String, Option<Value>)>,
}

impl Update {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`.
    #[must_use]
    pub fn set(self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(path, Some(value.into()))
    }

    /// Remove `path` from the document.
    #[must_use]
    pub fn unset(self, path: impl Into<String>) -> Self {
        self.field(path, None)
    }

    /// Set `path` when `value` is `Some`, remove it when `None`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: Option<Value>) -> Self {
        self.ops.push((path.into(), value));
        self
    }

    /// Check whether the update has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Iterate over `(path, value-or-unset)` pairs in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.ops.iter().map(|(p, v)| (p.as_str(), v.as_ref()))
    }

    /// Check whether any operation targets `path` exactly.
    #[must_use]
    pub fn touches(&self, path: &str) -> bool {
        self.ops.iter().any(|(p, _)| p == path)
    }

    /// Apply all operations to `doc` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFieldPath`] if a path is malformed, targets
    /// `_id`, or traverses a non-object value. The document is left
    /// untouched in that case.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        for (path, _) in &self.ops {
            let segments = split_path(path)?;
            if segments[0] == ID_FIELD {
                return Err(Error::invalid_field_path(
                    path,
                    "identity field is immutable",
                ));
            }
        }

        let mut working = doc.clone();
        for (path, value) in &self.ops {
            let segments = split_path(path)?;
            match value {
                Some(value) => set_path(&mut working, path, &segments, value.clone())?,
                None => unset_path(&mut working, &segments),
            }
        }
        *doc = working;
        Ok(())
    }
}

impl FromIterator<(String, Option<Value>)> for Update {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Split a dotted field path into its segments.
///
/// # Errors
///
/// Returns [`Error::InvalidFieldPath`] for empty paths, empty segments and
/// characters outside `[A-Za-z0-9_]`.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::invalid_field_path(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(Error::invalid_field_path(path, "empty path segment"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::invalid_field_path(
                path,
                "segments may only contain letters, digits and underscores",
            ));
        }
    }
    Ok(segments)
}

fn set_path(doc: &mut Document, path: &str, segments: &[&str], value: Value) -> Result<()> {
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| Error::invalid_field_path(path, "path is empty"))?;

    let mut current = doc;
    for segment in parents {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(Error::invalid_field_path(
                    path,
                    format!("'{segment}' is not an object"),
                ))
            }
        };
    }
    current.insert((*leaf).to_string(), value);
    Ok(())
}

fn unset_path(doc: &mut Document, segments: &[&str]) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = doc;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(Value::Object(map)) => current = map,
            _ => return,
        }
    }
    current.remove(*leaf);
}
