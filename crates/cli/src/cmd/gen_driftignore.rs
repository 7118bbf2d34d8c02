//! Gen-driftignore command implementation.
//!
//! Turns a saved scan report into ignore rules, so known findings can be
//! acknowledged and silenced on the next scan.

use std::path::Path;

use anyhow::{Context, Result};
use driftwatch_lib::analysis::GenDriftIgnoreOptions;

use super::fmt::load_analysis;

pub fn cmd_gen_driftignore(
  input: &Path,
  output: Option<&Path>,
  exclude_unmanaged: bool,
  exclude_deleted: bool,
  exclude_drifted: bool,
) -> Result<()> {
  let analysis = load_analysis(input)?;
  let opts = GenDriftIgnoreOptions {
    exclude_unmanaged,
    exclude_deleted,
    exclude_drifted,
  };
  let (count, rules) = analysis.drift_ignore_list(&opts);

  match output {
    Some(path) => {
      std::fs::write(path, format!("{rules}\n"))
        .with_context(|| format!("failed to write ignore rules to {}", path.display()))?;
      eprintln!("Wrote ignore rules for {} resource(s) to {}", count, path.display());
    }
    None => {
      println!("{rules}");
      eprintln!("Generated ignore rules for {count} resource(s)");
    }
  }
  Ok(())
}
