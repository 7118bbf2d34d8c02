//! Scan command implementation.
//!
//! Loads the two inventories, runs the analysis, renders the report, and
//! exits non-zero when drift was found.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use driftwatch_lib::alerter::Alerter;
use driftwatch_lib::analysis::Analyzer;
use driftwatch_lib::filter::DriftIgnore;
use driftwatch_lib::resource::SchemaRepository;
use driftwatch_lib::supplier::{JsonSupplier, Scan};

use crate::output::{self, OutputFormat};

const DEFAULT_IGNORE_FILE: &str = ".driftignore";

pub fn cmd_scan(from: &Path, to: &Path, driftignore: Option<&Path>, format: OutputFormat, quiet: bool) -> Result<()> {
  let filter = load_filter(driftignore)?;

  let schemas = Arc::new(SchemaRepository::new());
  let iac = JsonSupplier::new(from, schemas.clone());
  let remote = JsonSupplier::new(to, schemas);
  let alerter = Alerter::new();
  let scan = Scan::new(&iac, &remote, Analyzer::new(&alerter), &filter);

  let result = scan.run().context("scan failed")?;

  match format {
    OutputFormat::Json => output::print_json(&result.analysis)?,
    OutputFormat::Console => {
      output::print_console(&result.analysis, quiet);
      if !quiet {
        // Millisecond precision is plenty for a file-backed scan.
        let duration = Duration::from_millis(result.duration.as_millis() as u64);
        eprintln!("Scanned in {}", humantime::format_duration(duration));
      }
    }
  }

  if !result.analysis.is_sync() {
    std::process::exit(1);
  }
  Ok(())
}

/// An explicit rule file must exist; the default one is optional.
fn load_filter(driftignore: Option<&Path>) -> Result<DriftIgnore> {
  match driftignore {
    Some(path) => {
      DriftIgnore::from_path(path).with_context(|| format!("failed to load ignore rules from {}", path.display()))
    }
    None => {
      let default = Path::new(DEFAULT_IGNORE_FILE);
      if default.exists() {
        DriftIgnore::from_path(default).context("failed to load .driftignore")
      } else {
        Ok(DriftIgnore::default())
      }
    }
  }
}
