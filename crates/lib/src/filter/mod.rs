//! Inclusion/exclusion rules for resources and fields.
//!
//! The analyzer consults a [`Filter`] twice: once to decide whether a
//! resource takes part in the run at all, and once per change to decide
//! whether a drifted field is reported. [`DriftIgnore`] is the rule-list
//! implementation: one rule per line, `type.id` to ignore a resource,
//! `type.id.path.to.field` to ignore a field, `*` as a wildcard, `\.` to
//! escape dots inside identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, BufRead};
use std::path::Path;

use thiserror::Error;

use crate::resource::Resource;

/// Decides which resources and which changed fields are excluded from a run.
pub trait Filter {
  fn is_resource_ignored(&self, res: &Resource) -> bool;
  fn is_field_ignored(&self, res: &Resource, path: &[String]) -> bool;
}

#[derive(Debug, Error)]
pub enum IgnoreFileError {
  #[error("failed to read ignore file `{path}`: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },
}

/// Rule-list filter.
#[derive(Debug, Default)]
pub struct DriftIgnore {
  /// `type.id` rules without wildcards, matched exactly.
  resource_rules: BTreeSet<String>,
  /// `type.id` rules containing `*`, matched by [`wildcard_match`].
  resource_wildcard_rules: BTreeSet<String>,
  /// Field rules, keyed by `type.id` (or `type.*`), holding path segments.
  field_rules: BTreeMap<String, Vec<Vec<String>>>,
}

impl DriftIgnore {
  /// Parse rules from lines. Empty lines and `#` comments are skipped;
  /// lines with fewer than two segments are ignored with a warning.
  pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
    let mut ignore = DriftIgnore::default();
    for (number, line) in lines.into_iter().enumerate() {
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let segments = split_rule(line);
      match segments.len() {
        0 | 1 => {
          tracing::warn!(line = number + 1, content = line, "unable to parse ignore rule");
        }
        2 => {
          let rule = segments.join(".");
          if rule.contains('*') {
            ignore.resource_wildcard_rules.insert(rule);
          } else {
            ignore.resource_rules.insert(rule);
          }
        }
        _ => {
          let key = segments[..2].join(".");
          ignore.field_rules.entry(key).or_default().push(segments[2..].to_vec());
        }
      }
    }
    ignore
  }

  pub fn from_reader(reader: impl BufRead, path: &str) -> Result<Self, IgnoreFileError> {
    let lines: Vec<String> = reader
      .lines()
      .collect::<Result<_, _>>()
      .map_err(|source| IgnoreFileError::Read {
        path: path.to_string(),
        source,
      })?;
    Ok(Self::from_lines(lines.iter().map(String::as_str)))
  }

  pub fn from_path(path: &Path) -> Result<Self, IgnoreFileError> {
    let file = std::fs::File::open(path).map_err(|source| IgnoreFileError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_reader(io::BufReader::new(file), &path.display().to_string())
  }
}

impl Filter for DriftIgnore {
  fn is_resource_ignored(&self, res: &Resource) -> bool {
    let key = res.key();
    if self.resource_rules.contains(&key) {
      return true;
    }
    self
      .resource_wildcard_rules
      .iter()
      .any(|rule| wildcard_match(key.as_bytes(), rule.as_bytes()))
  }

  fn is_field_ignored(&self, res: &Resource, path: &[String]) -> bool {
    // Exact-key rules shadow the type-wide wildcard rules.
    let rules = self
      .field_rules
      .get(&res.key())
      .or_else(|| self.field_rules.get(&format!("{}.*", res.ty)));
    let Some(rules) = rules else {
      return false;
    };
    rules.iter().any(|rule| field_rule_matches(rule, path))
  }
}

/// A field rule matches when each of its segments equals (case-insensitive)
/// or wildcards the corresponding change-path segment. A rule shorter than
/// the path matches the whole subtree under it.
fn field_rule_matches(rule: &[String], path: &[String]) -> bool {
  if rule.len() > path.len() {
    return false;
  }
  rule
    .iter()
    .zip(path)
    .all(|(rule_seg, path_seg)| rule_seg == "*" || rule_seg.eq_ignore_ascii_case(path_seg))
}

/// Recursive wildcard matcher; `*` matches any run of characters.
fn wildcard_match(value: &[u8], pattern: &[u8]) -> bool {
  match (value, pattern) {
    ([], []) => true,
    (_, [b'*', pattern_rest @ ..]) => match value {
      [_, value_rest @ ..] => wildcard_match(value_rest, pattern) || wildcard_match(value, pattern_rest),
      [] => wildcard_match(value, pattern_rest),
    },
    ([v, value_rest @ ..], [p, pattern_rest @ ..]) if v == p => wildcard_match(value_rest, pattern_rest),
    _ => false,
  }
}

/// Split an ignore rule on unescaped dots. Runs of `*` collapse to one,
/// `\.` keeps a literal dot inside a segment, `\\` a literal backslash.
/// A trailing separator does not produce an empty segment.
fn split_rule(line: &str) -> Vec<String> {
  let mut line = line.to_string();
  while line.contains("**") {
    line = line.replace("**", "*");
  }

  let mut segments = Vec::new();
  let mut current = String::new();
  let mut trailing_separator = false;
  let mut chars = line.chars().peekable();
  while let Some(c) = chars.next() {
    trailing_separator = false;
    match c {
      '\\' => match chars.peek() {
        Some('\\') => {
          chars.next();
          current.push('\\');
        }
        Some('.') => {
          chars.next();
          current.push('.');
        }
        // Dangling escapes are dropped.
        _ => {}
      },
      '.' => {
        segments.push(std::mem::take(&mut current));
        trailing_separator = true;
      }
      _ => current.push(c),
    }
  }
  if !(current.is_empty() && trailing_separator) && !line.is_empty() {
    segments.push(current);
  }
  segments
}

#[cfg(test)]
mod tests {
  use super::*;

  fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn comments_and_blank_lines_are_skipped() {
    let ignore = DriftIgnore::from_lines(["# a comment", "", "aws_s3_bucket.foobar"]);
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "foobar")));
    assert!(!ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "barfoo")));
  }

  #[test]
  fn single_segment_rules_are_rejected() {
    let ignore = DriftIgnore::from_lines(["aws_s3_bucket"]);
    assert!(!ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "foobar")));
  }

  #[test]
  fn wildcard_id_ignores_the_whole_type() {
    let ignore = DriftIgnore::from_lines(["aws_s3_bucket.*"]);
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "foobar")));
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "barfoo")));
    assert!(!ignore.is_resource_ignored(&Resource::new("aws_iam_user", "foobar")));
  }

  #[test]
  fn wildcard_matches_inside_segments() {
    let ignore = DriftIgnore::from_lines(["aws_s3_*.bucket-*"]);
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "bucket-logs")));
    assert!(!ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "website")));
  }

  #[test]
  fn double_star_collapses() {
    let ignore = DriftIgnore::from_lines(["aws_s3_bucket.**"]);
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "anything")));
  }

  #[test]
  fn escaped_dots_stay_in_the_id() {
    let ignore = DriftIgnore::from_lines([r"aws_route53_record.foo\.bar\.com"]);
    assert!(ignore.is_resource_ignored(&Resource::new("aws_route53_record", "foo.bar.com")));
    assert!(!ignore.is_resource_ignored(&Resource::new("aws_route53_record", "foo")));
  }

  #[test]
  fn field_rule_matches_exact_path() {
    let ignore = DriftIgnore::from_lines(["aws_instance.web.tags.Name"]);
    let res = Resource::new("aws_instance", "web");

    assert!(ignore.is_field_ignored(&res, &path(&["tags", "Name"])));
    assert!(!ignore.is_field_ignored(&res, &path(&["tags", "Env"])));
    assert!(!ignore.is_resource_ignored(&res));
  }

  #[test]
  fn field_rule_is_case_insensitive_and_prefix_based() {
    let ignore = DriftIgnore::from_lines(["aws_instance.web.Tags"]);
    let res = Resource::new("aws_instance", "web");

    assert!(ignore.is_field_ignored(&res, &path(&["tags", "Name"])));
    assert!(ignore.is_field_ignored(&res, &path(&["tags"])));
  }

  #[test]
  fn field_rule_wildcard_segment() {
    let ignore = DriftIgnore::from_lines(["aws_instance.web.ebs_block_device.*.volume_size"]);
    let res = Resource::new("aws_instance", "web");

    assert!(ignore.is_field_ignored(&res, &path(&["ebs_block_device", "0", "volume_size"])));
    assert!(ignore.is_field_ignored(&res, &path(&["ebs_block_device", "3", "volume_size"])));
    assert!(!ignore.is_field_ignored(&res, &path(&["ebs_block_device", "0", "volume_type"])));
  }

  #[test]
  fn field_rules_under_type_wildcard_apply_to_all_ids() {
    let ignore = DriftIgnore::from_lines(["aws_instance.*.arn"]);

    assert!(ignore.is_field_ignored(&Resource::new("aws_instance", "web"), &path(&["arn"])));
    assert!(ignore.is_field_ignored(&Resource::new("aws_instance", "db"), &path(&["arn"])));
    assert!(!ignore.is_field_ignored(&Resource::new("aws_lambda_function", "fn"), &path(&["arn"])));
  }

  #[test]
  fn exact_field_rules_shadow_type_wildcard_rules() {
    let ignore = DriftIgnore::from_lines(["aws_instance.*.arn", "aws_instance.web.tags"]);
    let res = Resource::new("aws_instance", "web");

    // The exact `aws_instance.web` rule set wins; the wildcard arn rule no
    // longer applies to this id.
    assert!(ignore.is_field_ignored(&res, &path(&["tags"])));
    assert!(!ignore.is_field_ignored(&res, &path(&["arn"])));
    assert!(ignore.is_field_ignored(&Resource::new("aws_instance", "db"), &path(&["arn"])));
  }

  #[test]
  fn reads_rules_from_a_file() {
    use std::io::Write;

    let dir = tempfile::TempDir::new().unwrap();
    let file_path = dir.path().join(".driftignore");
    let mut file = std::fs::File::create(&file_path).unwrap();
    writeln!(file, "# ignore the log bucket").unwrap();
    writeln!(file, "aws_s3_bucket.logs").unwrap();

    let ignore = DriftIgnore::from_path(&file_path).unwrap();
    assert!(ignore.is_resource_ignored(&Resource::new("aws_s3_bucket", "logs")));

    assert!(DriftIgnore::from_path(&dir.path().join("missing")).is_err());
  }
}
