//! Resource suppliers and the scan orchestrator.
//!
//! A [`Supplier`] produces one fully-materialized inventory; the engine does
//! not care how it is fetched. [`JsonSupplier`] loads one from a file and is
//! the stand-in for the cloud enumerators and state-file backends.
//! [`Scan`] drives the whole run: IaC phase, remote phase, analysis.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use crate::analysis::{Analysis, AnalyzeError, Analyzer};
use crate::filter::Filter;
use crate::resource::{Attributes, Resource, SchemaRepository, StateSource};

/// Produces a resource inventory. Partial failures worth surfacing are sent
/// to the alerter by the supplier itself; a returned error is fatal for the
/// run.
pub trait Supplier {
  fn resources(&self) -> Result<Vec<Resource>, SupplierError>;
}

#[derive(Debug, Error)]
pub enum SupplierError {
  #[error("failed to read inventory `{path}`: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to decode inventory `{path}`: {source}")]
  Decode {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}

/// One entry of an inventory file.
#[derive(Debug, Deserialize)]
struct InventoryRecord {
  id: String,
  #[serde(rename = "type")]
  ty: String,
  #[serde(default)]
  attributes: Attributes,
  #[serde(default)]
  source: Option<StateSource>,
}

/// Loads `[{"id", "type", "attributes"?, "source"?}, ...]` from a file,
/// resolving each resource's schema from the shared repository.
pub struct JsonSupplier {
  path: PathBuf,
  schemas: Arc<SchemaRepository>,
}

impl JsonSupplier {
  pub fn new(path: impl Into<PathBuf>, schemas: Arc<SchemaRepository>) -> Self {
    Self {
      path: path.into(),
      schemas,
    }
  }
}

impl Supplier for JsonSupplier {
  fn resources(&self) -> Result<Vec<Resource>, SupplierError> {
    let contents = std::fs::read_to_string(&self.path).map_err(|source| SupplierError::Read {
      path: self.path.display().to_string(),
      source,
    })?;
    let records: Vec<InventoryRecord> = serde_json::from_str(&contents).map_err(|source| SupplierError::Decode {
      path: self.path.display().to_string(),
      source,
    })?;
    Ok(
      records
        .into_iter()
        .map(|record| Resource {
          schema: self.schemas.get(&record.ty),
          id: record.id,
          ty: record.ty,
          attributes: record.attributes,
          source: record.source,
        })
        .collect(),
    )
  }
}

#[derive(Debug, Error)]
pub enum ScanError {
  #[error("failed to read IaC resources")]
  Iac(#[source] SupplierError),
  #[error("failed to enumerate remote resources")]
  Remote(#[source] SupplierError),
  #[error(transparent)]
  Analyze(#[from] AnalyzeError),
}

pub struct ScanResult {
  pub analysis: Analysis,
  pub duration: Duration,
}

/// One drift-detection run over a pair of suppliers.
pub struct Scan<'a> {
  iac: &'a dyn Supplier,
  remote: &'a dyn Supplier,
  analyzer: Analyzer<'a>,
  filter: &'a dyn Filter,
}

impl<'a> Scan<'a> {
  pub fn new(iac: &'a dyn Supplier, remote: &'a dyn Supplier, analyzer: Analyzer<'a>, filter: &'a dyn Filter) -> Self {
    Self {
      iac,
      remote,
      analyzer,
      filter,
    }
  }

  /// A supplier error aborts the run; alerts, by contrast, ride along with
  /// a successful analysis.
  pub fn run(&self) -> Result<ScanResult, ScanError> {
    let started = Instant::now();

    tracing::info!("start reading IaC resources");
    let state_resources = self.iac.resources().map_err(ScanError::Iac)?;
    tracing::info!(count = state_resources.len(), "finished reading IaC resources");

    tracing::info!("start enumerating remote resources");
    let remote_resources = self.remote.resources().map_err(ScanError::Remote)?;
    tracing::info!(count = remote_resources.len(), "finished enumerating remote resources");

    let analysis = self.analyzer.analyze(&remote_resources, &state_resources, self.filter)?;

    Ok(ScanResult {
      analysis,
      duration: started.elapsed(),
    })
  }
}

/// Helper for callers that already hold inventories in memory.
pub struct StaticSupplier {
  resources: Vec<Resource>,
}

impl StaticSupplier {
  pub fn new(resources: Vec<Resource>) -> Self {
    Self { resources }
  }
}

impl Supplier for StaticSupplier {
  fn resources(&self) -> Result<Vec<Resource>, SupplierError> {
    Ok(self.resources.clone())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::alerter::Alerter;
  use crate::filter::DriftIgnore;

  fn write_inventory(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{contents}").unwrap();
    path
  }

  #[test]
  fn json_supplier_loads_resources_with_schema_and_source() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_inventory(
      dir.path(),
      "state.json",
      r#"[
        {
          "id": "web",
          "type": "aws_instance",
          "attributes": {"instance_type": "t3.micro"},
          "source": {"state": "terraform.tfstate", "module": "", "name": "web"}
        },
        {"id": "logs", "type": "aws_s3_bucket"}
      ]"#,
    );

    let mut repo = SchemaRepository::new();
    repo.update_attribute("aws_instance", "arn", |meta| meta.computed = true);
    let supplier = JsonSupplier::new(&path, Arc::new(repo));

    let resources = supplier.resources().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].key(), "aws_instance.web");
    assert_eq!(resources[0].attributes["instance_type"], "t3.micro");
    assert!(resources[0].schema.is_some());
    assert_eq!(resources[0].source_string().unwrap(), "aws_instance.web");
    assert!(resources[1].schema.is_none());
    assert!(resources[1].attributes.is_empty());
  }

  #[test]
  fn missing_inventory_file_is_a_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let supplier = JsonSupplier::new(dir.path().join("missing.json"), Arc::new(SchemaRepository::new()));
    assert!(matches!(supplier.resources(), Err(SupplierError::Read { .. })));
  }

  #[test]
  fn malformed_inventory_is_a_decode_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_inventory(dir.path(), "bad.json", "{not json");
    let supplier = JsonSupplier::new(&path, Arc::new(SchemaRepository::new()));
    assert!(matches!(supplier.resources(), Err(SupplierError::Decode { .. })));
  }

  #[test]
  fn scan_runs_both_phases_and_analyzes() {
    let dir = tempfile::TempDir::new().unwrap();
    let schemas = Arc::new(SchemaRepository::new());
    let state_path = write_inventory(
      dir.path(),
      "state.json",
      r#"[{"id": "web", "type": "aws_instance", "attributes": {"instance_type": "t3.micro"}}]"#,
    );
    let remote_path = write_inventory(
      dir.path(),
      "remote.json",
      r#"[
        {"id": "web", "type": "aws_instance", "attributes": {"instance_type": "t3.large"}},
        {"id": "logs", "type": "aws_s3_bucket"}
      ]"#,
    );

    let iac = JsonSupplier::new(&state_path, schemas.clone());
    let remote = JsonSupplier::new(&remote_path, schemas);
    let alerter = Alerter::new();
    let filter = DriftIgnore::default();
    let scan = Scan::new(&iac, &remote, Analyzer::new(&alerter), &filter);

    let result = scan.run().unwrap();
    let analysis = result.analysis;
    assert_eq!(analysis.summary().total_managed, 1);
    assert_eq!(analysis.summary().total_unmanaged, 1);
    assert_eq!(analysis.summary().total_drifted, 1);
    assert!(!analysis.is_sync());
  }

  #[test]
  fn supplier_failure_aborts_the_scan() {
    let dir = tempfile::TempDir::new().unwrap();
    let schemas = Arc::new(SchemaRepository::new());
    let iac = JsonSupplier::new(dir.path().join("missing.json"), schemas.clone());
    let remote = StaticSupplier::new(Vec::new());
    let alerter = Alerter::new();
    let filter = DriftIgnore::default();
    let scan = Scan::new(&iac, &remote, Analyzer::new(&alerter), &filter);

    assert!(matches!(scan.run(), Err(ScanError::Iac(_))));
  }
}
