//! The reconciliation algorithm.
//!
//! [`Analyzer::analyze`] consumes two fully-materialized inventories — the
//! cloud-enumerated resources and the IaC-declared ones — and classifies
//! every resource as managed, unmanaged or deleted, computing a changelog
//! for each managed pair. The call is synchronous and single-threaded; the
//! parallel fan-out lives in the suppliers.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::alerter::{Alert, Alerter};
use crate::diff::{self, DiffError};
use crate::filter::Filter;
use crate::resource::Resource;

use super::report::{Analysis, Difference};

/// Unmanaged resources of this type are a common false positive: providers
/// materialize rules implied by other declarations.
pub const SECURITY_GROUP_RULE_TYPE: &str = "aws_security_group_rule";

/// Refines the default `(type, id)` correspondence for one resource type,
/// for providers that can return several logical resources under one id.
pub type Discriminant = Box<dyn Fn(&Resource, &Resource) -> bool + Send + Sync>;

#[derive(Debug, Error)]
pub enum AnalyzeError {
  #[error("failed to diff resource `{ty}.{id}`: {source}")]
  Diff {
    ty: String,
    id: String,
    #[source]
    source: DiffError,
  },
}

pub struct Analyzer<'a> {
  alerter: &'a Alerter,
  discriminants: BTreeMap<String, Discriminant>,
}

impl<'a> Analyzer<'a> {
  pub fn new(alerter: &'a Alerter) -> Self {
    Self {
      alerter,
      discriminants: BTreeMap::new(),
    }
  }

  /// Register a per-type discriminant. The strategy map is explicit state
  /// of this analyzer, not a process-wide registry.
  pub fn with_discriminant(
    mut self,
    ty: impl Into<String>,
    discriminant: impl Fn(&Resource, &Resource) -> bool + Send + Sync + 'static,
  ) -> Self {
    self.discriminants.insert(ty.into(), Box::new(discriminant));
    self
  }

  fn same_resource(&self, state: &Resource, remote: &Resource) -> bool {
    if state.ty != remote.ty || state.id != remote.id {
      return false;
    }
    match self.discriminants.get(&state.ty) {
      Some(discriminant) => discriminant(state, remote),
      None => true,
    }
  }

  /// Reconcile the two inventories into an [`Analysis`].
  ///
  /// A structural diff failure aborts the whole call; no partial analysis
  /// is returned.
  pub fn analyze(
    &self,
    remote_resources: &[Resource],
    state_resources: &[Resource],
    filter: &dyn Filter,
  ) -> Result<Analysis, AnalyzeError> {
    let mut analysis = Analysis::default();

    // Remote resources claimed by no state resource end up unmanaged.
    let mut candidate_remote: Vec<&Resource> = remote_resources
      .iter()
      .filter(|res| !filter.is_resource_ignored(res) && !self.alerter.is_resource_ignored(res))
      .collect();

    let mut computed_diff = false;

    for state_res in state_resources {
      if filter.is_resource_ignored(state_res) || self.alerter.is_resource_ignored(state_res) {
        tracing::debug!(resource = %state_res.key(), "state resource ignored");
        continue;
      }

      let Some(index) = candidate_remote.iter().position(|remote| self.same_resource(state_res, remote)) else {
        tracing::debug!(resource = %state_res.key(), "declared resource not found on remote");
        analysis.add_deleted(state_res.clone());
        continue;
      };

      // At most one state resource may claim a given remote resource.
      let remote_res = candidate_remote.remove(index);
      analysis.add_managed(state_res.clone());

      let delta =
        diff::changelog_objects(&state_res.attributes, &remote_res.attributes).map_err(|source| AnalyzeError::Diff {
          ty: state_res.ty.clone(),
          id: state_res.id.clone(),
          source,
        })?;
      if delta.is_empty() {
        continue;
      }

      let mut changelog = Vec::with_capacity(delta.len());
      for mut change in delta {
        if filter.is_field_ignored(state_res, &change.path) {
          continue;
        }
        if let Some(schema) = &state_res.schema {
          change.computed = schema.is_computed_field(&change.path);
          change.json_string = schema.is_json_string_field(&change.path);
        }
        computed_diff |= change.computed;
        changelog.push(change);
      }
      if !changelog.is_empty() {
        analysis.add_difference(Difference {
          resource: state_res.clone(),
          changelog,
        });
      }
    }

    // One alert for the whole run, however many resources drifted on
    // computed fields.
    if computed_diff {
      self.alerter.send_alert("", Alert::ComputedDiff);
    }
    if candidate_remote.iter().any(|res| res.ty == SECURITY_GROUP_RULE_TYPE) {
      self.alerter.send_alert("", Alert::UnmanagedSecurityGroupRules);
    }

    for remote_res in candidate_remote {
      analysis.add_unmanaged(remote_res.clone());
    }

    analysis.sort_resources();
    analysis.set_alerts(self.alerter.retrieve());

    Ok(analysis)
  }
}
