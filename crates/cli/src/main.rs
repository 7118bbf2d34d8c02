use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// driftwatch - Detect drift between IaC state and live cloud resources
#[derive(Parser)]
#[command(name = "driftwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compare an IaC inventory against a remote inventory
  Scan {
    /// IaC-declared resource inventory (JSON)
    #[arg(long, value_name = "FILE")]
    from: PathBuf,

    /// Cloud-enumerated resource inventory (JSON)
    #[arg(long, value_name = "FILE")]
    to: PathBuf,

    /// Ignore rule file (default: .driftignore when present)
    #[arg(long, value_name = "FILE")]
    driftignore: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,
  },

  /// Re-render a previously saved scan report
  Fmt {
    /// Saved report (JSON)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Generate ignore rules from a previously saved scan report
  GenDriftignore {
    /// Saved report (JSON)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write rules to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Leave resources not covered by IaC out of the rules
    #[arg(long)]
    exclude_unmanaged: bool,

    /// Leave missing resources out of the rules
    #[arg(long)]
    exclude_deleted: bool,

    /// Leave changed resources out of the rules
    #[arg(long)]
    exclude_drifted: bool,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Scan {
      from,
      to,
      driftignore,
      output,
      quiet,
    } => cmd::scan::cmd_scan(&from, &to, driftignore.as_deref(), output, quiet),
    Commands::Fmt { input, output } => cmd::fmt::cmd_fmt(&input, output),
    Commands::GenDriftignore {
      input,
      output,
      exclude_unmanaged,
      exclude_deleted,
      exclude_drifted,
    } => cmd::gen_driftignore::cmd_gen_driftignore(&input, output.as_deref(), exclude_unmanaged, exclude_deleted, exclude_drifted),
  }
}
