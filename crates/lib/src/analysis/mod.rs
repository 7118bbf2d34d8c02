//! Drift analysis: the core reconciliation algorithm and its report.

pub mod analyzer;
pub mod report;

pub use analyzer::{AnalyzeError, Analyzer, SECURITY_GROUP_RULE_TYPE};
pub use report::{Analysis, Difference, GenDriftIgnoreOptions, Summary};
