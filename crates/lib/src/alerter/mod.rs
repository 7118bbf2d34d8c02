//! Alert collection.
//!
//! Enumerators and state readers run in parallel and report partial failures
//! as alerts rather than hard errors. The [`Alerter`] collects them under a
//! string key (`""` for the whole run, `"type.id"` for one resource, `"type"`
//! for every resource of a type) until the orchestrator drains them into the
//! final report. Some alerts additionally exclude the resources they are
//! attached to from coverage accounting.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

pub const COMPUTED_DIFF_MESSAGE: &str =
  "You have diffs on computed fields, check the documentation for potential false positive drifts";
pub const UNMANAGED_SECURITY_GROUP_RULES_MESSAGE: &str =
  "You have unmanaged security group rules that could be false positives, find out more in the documentation";

/// One alert raised during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
  /// A state file could not be read or decoded.
  StateRead { message: String },
  /// At least one drift was found on a computed field.
  ComputedDiff,
  /// Unmanaged security group rules were found in the cloud.
  UnmanagedSecurityGroupRules,
  /// The remote denied access while enumerating or reading a resource.
  /// `provider_message` carries remediation guidance specific to the
  /// provider, shown separately from the alert itself.
  RemoteAccessDenied {
    message: String,
    provider_message: String,
  },
}

impl Alert {
  pub fn message(&self) -> &str {
    match self {
      Alert::StateRead { message } => message,
      Alert::ComputedDiff => COMPUTED_DIFF_MESSAGE,
      Alert::UnmanagedSecurityGroupRules => UNMANAGED_SECURITY_GROUP_RULES_MESSAGE,
      Alert::RemoteAccessDenied { message, .. } => message,
    }
  }

  /// Whether resources under this alert's key are dropped from coverage
  /// accounting. This is softer than an ignore rule: the alert still shows
  /// up in the report.
  pub fn should_ignore_resource(&self) -> bool {
    matches!(self, Alert::RemoteAccessDenied { .. })
  }
}

/// Lossy wire form of an alert: only the message survives serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAlert {
  pub message: String,
}

impl From<&Alert> for SerializedAlert {
  fn from(alert: &Alert) -> Self {
    Self {
      message: alert.message().to_string(),
    }
  }
}

impl From<SerializedAlert> for Alert {
  fn from(alert: SerializedAlert) -> Self {
    Alert::StateRead { message: alert.message }
  }
}

/// Alerts accumulated during a run, keyed by scope.
pub type Alerts = BTreeMap<String, Vec<Alert>>;

/// Thread-safe alert mailbox.
///
/// Senders may run on any number of threads; every `send_alert` that
/// happens-before [`Alerter::retrieve`] is visible in the drained map, and
/// alerts from one sender under one key keep their append order.
#[derive(Debug, Default)]
pub struct Alerter {
  alerts: Mutex<Alerts>,
}

impl Alerter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn send_alert(&self, key: impl Into<String>, alert: Alert) {
    let mut alerts = self.alerts.lock().expect("alerter mutex poisoned");
    alerts.entry(key.into()).or_default().push(alert);
  }

  /// Drain the accumulated alerts.
  ///
  /// Draining is destructive: a second call returns an empty map, and
  /// alerts sent afterwards accumulate into a fresh one. The orchestrator
  /// calls this exactly once per run, after all senders have finished.
  pub fn retrieve(&self) -> Alerts {
    let mut alerts = self.alerts.lock().expect("alerter mutex poisoned");
    std::mem::take(&mut *alerts)
  }

  /// Whether any alert under the exact `"type.id"` key or the `"type"`
  /// wildcard key excludes this resource. The keys are checked
  /// independently: a non-ignoring alert under one does not cancel an
  /// ignoring alert under the other.
  pub fn is_resource_ignored(&self, res: &Resource) -> bool {
    let alerts = self.alerts.lock().expect("alerter mutex poisoned");
    let ignored = |key: &str| {
      alerts
        .get(key)
        .is_some_and(|entries| entries.iter().any(Alert::should_ignore_resource))
    };
    ignored(&res.key()) || ignored(&res.ty)
  }
}
