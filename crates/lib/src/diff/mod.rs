//! Structural diff between two attribute trees.
//!
//! [`changelog`] walks two JSON-like trees in parallel and produces an
//! ordered list of typed changes. Objects are compared by key union, arrays
//! strictly by position: inserting or removing an element in the middle of a
//! sequence shifts every later index and shows up as a cascade of changes.
//! That positional behavior is part of the engine's contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Trees nested deeper than this cannot be diffed.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum DiffError {
  #[error("attribute tree at `{path}` exceeds the maximum nesting depth of {MAX_DEPTH}")]
  TooDeep { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Create,
  Update,
  Delete,
}

/// One difference between the declared and the actual attribute tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
  #[serde(rename = "type")]
  pub kind: ChangeKind,
  /// Full path from the attribute root; map keys and array indices are both
  /// segments.
  pub path: Vec<String>,
  /// Declared value, `Null` for a create.
  pub from: Value,
  /// Actual value, `Null` for a delete.
  pub to: Value,
  /// The path is assigned by the provider and expected to differ.
  #[serde(default)]
  pub computed: bool,
  /// The path holds a JSON document encoded as a string. Affects display
  /// only, never comparison, and stays out of the wire format.
  #[serde(skip)]
  pub json_string: bool,
}

impl Change {
  fn new(kind: ChangeKind, path: &[String], from: Value, to: Value) -> Self {
    Self {
      kind,
      path: path.to_vec(),
      from,
      to,
      computed: false,
      json_string: false,
    }
  }

  pub fn dotted_path(&self) -> String {
    self.path.join(".")
  }
}

/// Compute the ordered changelog turning `from` into `to`.
///
/// `Null` and absent are equivalent on both sides. Scalar equality is
/// representation-aware: `1` and `1.0` are different values, matching what
/// the upstream decoders produce.
pub fn changelog(from: &Value, to: &Value) -> Result<Vec<Change>, DiffError> {
  let mut changes = Vec::new();
  walk(&mut Vec::new(), present(Some(from)), present(Some(to)), 0, &mut changes)?;
  Ok(changes)
}

/// Changelog between two attribute bags. Equivalent to [`changelog`] over
/// two object roots.
pub fn changelog_objects(
  from: &serde_json::Map<String, Value>,
  to: &serde_json::Map<String, Value>,
) -> Result<Vec<Change>, DiffError> {
  let mut changes = Vec::new();
  walk_objects(&mut Vec::new(), from, to, 0, &mut changes)?;
  Ok(changes)
}

/// Explicit null counts as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
  value.filter(|v| !v.is_null())
}

fn walk(
  path: &mut Vec<String>,
  from: Option<&Value>,
  to: Option<&Value>,
  depth: usize,
  changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
  if depth > MAX_DEPTH {
    return Err(DiffError::TooDeep { path: path.join(".") });
  }

  match (from, to) {
    (None, None) => {}
    (None, Some(to)) => {
      changes.push(Change::new(ChangeKind::Create, path, Value::Null, to.clone()));
    }
    (Some(from), None) => {
      changes.push(Change::new(ChangeKind::Delete, path, from.clone(), Value::Null));
    }
    (Some(Value::Object(from)), Some(Value::Object(to))) => {
      walk_objects(path, from, to, depth, changes)?;
    }
    (Some(Value::Array(from)), Some(Value::Array(to))) => {
      for index in 0..from.len().max(to.len()) {
        path.push(index.to_string());
        walk(path, present(from.get(index)), present(to.get(index)), depth + 1, changes)?;
        path.pop();
      }
    }
    (Some(from), Some(to)) => {
      // Scalars, and containers of mismatched kinds, compare as a whole.
      if from != to {
        changes.push(Change::new(ChangeKind::Update, path, from.clone(), to.clone()));
      }
    }
  }
  Ok(())
}

fn walk_objects(
  path: &mut Vec<String>,
  from: &serde_json::Map<String, Value>,
  to: &serde_json::Map<String, Value>,
  depth: usize,
  changes: &mut Vec<Change>,
) -> Result<(), DiffError> {
  if depth > MAX_DEPTH {
    return Err(DiffError::TooDeep { path: path.join(".") });
  }

  for (key, from_value) in from {
    path.push(key.clone());
    walk(path, present(Some(from_value)), present(to.get(key)), depth + 1, changes)?;
    path.pop();
  }
  for (key, to_value) in to {
    if from.contains_key(key) {
      continue;
    }
    path.push(key.clone());
    walk(path, None, present(Some(to_value)), depth + 1, changes)?;
    path.pop();
  }
  Ok(())
}
