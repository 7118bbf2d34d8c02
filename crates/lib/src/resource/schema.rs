//! Resource schema metadata.
//!
//! Schemas describe which attribute paths of a resource type are computed
//! (assigned by the provider, expected to differ from the declared value) or
//! JSON-string-encoded (need semantic rather than textual display). The
//! repository owns one schema per type and hands out shared references, so
//! schema data is never duplicated per resource.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata for a single attribute path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeSchema {
  pub computed: bool,
  pub json_string: bool,
}

/// Attribute metadata for one resource type, keyed by dot-joined path.
#[derive(Debug, Clone, Default)]
pub struct Schema {
  pub attributes: BTreeMap<String, AttributeSchema>,
}

impl Schema {
  pub fn is_computed_field(&self, path: &[String]) -> bool {
    self
      .attributes
      .get(&path.join("."))
      .is_some_and(|meta| meta.computed)
  }

  pub fn is_json_string_field(&self, path: &[String]) -> bool {
    self
      .attributes
      .get(&path.join("."))
      .is_some_and(|meta| meta.json_string)
  }
}

/// Shared schema store, keyed by resource type.
#[derive(Debug, Default)]
pub struct SchemaRepository {
  schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRepository {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, ty: &str) -> Option<Arc<Schema>> {
    self.schemas.get(ty).cloned()
  }

  pub fn insert(&mut self, ty: impl Into<String>, schema: Schema) {
    self.schemas.insert(ty.into(), Arc::new(schema));
  }

  /// Update attribute metadata for a type, creating the schema if missing.
  pub fn update_attribute(&mut self, ty: &str, path: &str, f: impl FnOnce(&mut AttributeSchema)) {
    let entry = self.schemas.entry(ty.to_string()).or_default();
    let schema = Arc::make_mut(entry);
    f(schema.attributes.entry(path.to_string()).or_default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn computed_lookup_is_exact_on_joined_path() {
    let mut repo = SchemaRepository::new();
    repo.update_attribute("aws_instance", "arn", |meta| meta.computed = true);
    let schema = repo.get("aws_instance").unwrap();

    assert!(schema.is_computed_field(&path(&["arn"])));
    assert!(!schema.is_computed_field(&path(&["architecture"])));
    // Positional index segments do not match the block-level path.
    assert!(!schema.is_computed_field(&path(&["ebs_block_device", "0", "volume_size"])));
  }

  #[test]
  fn json_string_lookup() {
    let mut repo = SchemaRepository::new();
    repo.update_attribute("aws_sqs_queue", "policy", |meta| meta.json_string = true);
    let schema = repo.get("aws_sqs_queue").unwrap();

    assert!(schema.is_json_string_field(&path(&["policy"])));
    assert!(!schema.is_computed_field(&path(&["policy"])));
  }

  #[test]
  fn repository_shares_one_schema_per_type() {
    let mut repo = SchemaRepository::new();
    repo.insert("aws_iam_user", Schema::default());

    let a = repo.get("aws_iam_user").unwrap();
    let b = repo.get("aws_iam_user").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(repo.get("aws_unknown").is_none());
  }
}
