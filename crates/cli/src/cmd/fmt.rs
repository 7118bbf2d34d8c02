//! Fmt command implementation.
//!
//! Re-renders a previously saved scan report, e.g. to turn a JSON report
//! produced in CI back into console output.

use std::path::Path;

use anyhow::{Context, Result};
use driftwatch_lib::analysis::Analysis;

use crate::output::{self, OutputFormat};

pub fn cmd_fmt(input: &Path, format: OutputFormat) -> Result<()> {
  let analysis = load_analysis(input)?;
  match format {
    OutputFormat::Json => output::print_json(&analysis)?,
    OutputFormat::Console => output::print_console(&analysis, false),
  }
  Ok(())
}

pub fn load_analysis(input: &Path) -> Result<Analysis> {
  let contents =
    std::fs::read_to_string(input).with_context(|| format!("failed to read report {}", input.display()))?;
  serde_json::from_str(&contents).with_context(|| format!("failed to decode report {}", input.display()))
}
