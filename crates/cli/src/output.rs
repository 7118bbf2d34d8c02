//! CLI output formatting utilities.
//!
//! Provides the console rendering of an analysis (resource sections, change
//! lines, alerts, summary) and the JSON printer used by `--output json`.

use anyhow::Context;
use clap::ValueEnum;
use driftwatch_lib::analysis::Analysis;
use driftwatch_lib::diff::ChangeKind;
use driftwatch_lib::resource::Resource;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Console,
  Json,
}

pub mod symbols {
  pub const WARNING: &str = "⚠";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

pub fn print_json(analysis: &Analysis) -> anyhow::Result<()> {
  let rendered = serde_json::to_string_pretty(analysis).context("failed to serialize analysis")?;
  println!("{rendered}");
  Ok(())
}

pub fn print_console(analysis: &Analysis, quiet: bool) {
  if !quiet {
    print_resource_section("Found missing resources:", analysis.deleted());
    print_resource_section("Found resources not covered by IaC:", analysis.unmanaged());
    print_changed_section(analysis);
    print_alerts(analysis);
  }
  print_summary(analysis);
}

fn print_resource_section(title: &str, resources: &[Resource]) {
  if resources.is_empty() {
    return;
  }
  println!("{title}");
  let mut current_type: Option<&str> = None;
  for res in resources {
    if current_type != Some(res.ty.as_str()) {
      println!("  {}:", res.ty);
      current_type = Some(res.ty.as_str());
    }
    match res.source_string() {
      Some(source) => println!("    - {} ({})", res.id, source),
      None => println!("    - {}", res.id),
    }
  }
}

fn print_changed_section(analysis: &Analysis) {
  if analysis.differences().is_empty() {
    return;
  }
  println!("Found changed resources:");
  for difference in analysis.differences() {
    println!("  - {} ({}):", difference.resource.id, difference.resource.ty);
    for change in &difference.changelog {
      let symbol = match change.kind {
        ChangeKind::Create => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
        ChangeKind::Update => symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
        ChangeKind::Delete => symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
      };
      let mut line = format!(
        "    {} {}: {} => {}",
        symbol,
        change.dotted_path(),
        render_value(&change.from),
        render_value(&change.to)
      );
      if change.computed {
        line.push_str(" (computed)");
      }
      println!("{line}");
    }
  }
}

fn print_alerts(analysis: &Analysis) {
  if analysis.alerts().is_empty() {
    return;
  }
  for entries in analysis.alerts().values() {
    for alert in entries {
      println!(
        "{} {}",
        symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()),
        alert.message()
      );
    }
  }
}

fn print_summary(analysis: &Analysis) {
  let summary = analysis.summary();
  println!("Found {} resource(s)", summary.total_resources);
  println!(" - {}% coverage", analysis.coverage());
  println!(" - {} resource(s) managed by IaC", summary.total_managed);
  println!(" - {} resource(s) not managed by IaC", summary.total_unmanaged);
  println!(
    " - {} resource(s) found in IaC state but missing on the remote",
    summary.total_deleted
  );
  if analysis.is_sync() {
    println!(
      "{}",
      "Congrats! Your infrastructure is fully in sync.".if_supports_color(Stream::Stdout, |s| s.green())
    );
  }
}

fn render_value(value: &serde_json::Value) -> String {
  value.to_string()
}
