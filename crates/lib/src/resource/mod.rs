//! Provider-agnostic resource model.
//!
//! A [`Resource`] is one record out of an inventory, whether it came from an
//! IaC state file or from a cloud enumeration. Resources are built by a
//! supplier, handed to the analyzer read-only, and owned by the final
//! [`Analysis`](crate::analysis::Analysis) lists.

pub mod schema;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use schema::{AttributeSchema, Schema, SchemaRepository};

/// Nested attribute tree of a resource.
///
/// Insertion-ordered so that output and diffs are stable across runs.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Where an IaC-sourced resource was declared.
///
/// Used for reporting and grouping only, never for identity comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSource {
  /// State file the resource was read from.
  pub state: String,
  /// Module path inside the state, empty for the root module.
  pub module: String,
  /// Resource name as declared in the configuration.
  pub name: String,
}

impl StateSource {
  pub fn new(state: impl Into<String>, module: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      state: state.into(),
      module: module.into(),
      name: name.into(),
    }
  }
}

/// One cloud or IaC resource.
#[derive(Debug, Clone, Default)]
pub struct Resource {
  /// Provider-assigned identifier. Not globally unique across types.
  pub id: String,
  /// Resource-type discriminator, e.g. `aws_s3_bucket`.
  pub ty: String,
  /// Arbitrary nested attributes. Read-only once submitted to the analyzer.
  pub attributes: Attributes,
  /// Shared reference into the schema repository, if a schema is known.
  pub schema: Option<Arc<Schema>>,
  /// Declaration site for IaC-sourced resources.
  pub source: Option<StateSource>,
}

impl Resource {
  pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ty: ty.into(),
      ..Default::default()
    }
  }

  pub fn with_attributes(mut self, attributes: Attributes) -> Self {
    self.attributes = attributes;
    self
  }

  pub fn with_schema(mut self, schema: Arc<Schema>) -> Self {
    self.schema = Some(schema);
    self
  }

  pub fn with_source(mut self, source: StateSource) -> Self {
    self.source = Some(source);
    self
  }

  /// The `type.id` key under which alerts and ignore rules address this
  /// resource.
  pub fn key(&self) -> String {
    format!("{}.{}", self.ty, self.id)
  }

  /// Human-readable declaration site, e.g. `module.s3.aws_s3_bucket.website`.
  pub fn source_string(&self) -> Option<String> {
    let source = self.source.as_ref()?;
    if source.module.is_empty() {
      return Some(format!("{}.{}", self.ty, source.name));
    }
    Some(format!("{}.{}.{}", source.module, self.ty, source.name))
  }
}

/// Two resources with the same `(type, id)` pair refer to the same
/// real-world object.
///
/// Equality is intentionally limited to identity: attribute differences are
/// drift, not distinct resources. Per-type discriminants refine this in the
/// analyzer for providers that reuse ids.
impl PartialEq for Resource {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id && self.ty == other.ty
  }
}

impl Eq for Resource {}

/// Sort resources by type, then id, for deterministic output.
pub fn sort_resources(resources: &mut [Resource]) {
  resources.sort_by(|a, b| a.ty.cmp(&b.ty).then_with(|| a.id.cmp(&b.id)));
}

/// Minimal `{id, type}` form under which resources appear in serialized
/// reports. The attribute bag is not part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStub {
  pub id: String,
  #[serde(rename = "type")]
  pub ty: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<StateSource>,
}

impl From<&Resource> for ResourceStub {
  fn from(res: &Resource) -> Self {
    Self {
      id: res.id.clone(),
      ty: res.ty.clone(),
      source: res.source.clone(),
    }
  }
}

impl From<ResourceStub> for Resource {
  fn from(stub: ResourceStub) -> Self {
    Self {
      id: stub.id,
      ty: stub.ty,
      source: stub.source,
      ..Default::default()
    }
  }
}
