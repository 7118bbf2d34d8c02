//! driftwatch-lib: Core types and logic for Driftwatch
//!
//! This crate provides the engine that reconciles two resource inventories:
//! - `Resource`: provider-agnostic record for one cloud or IaC resource
//! - `DriftIgnore`: rule-based inclusion/exclusion of resources and fields
//! - `Alerter`: thread-safe mailbox collecting alerts during a run
//! - `changelog`: structural diff between two attribute trees
//! - `Analyzer`: matches state against cloud resources and builds the report
//! - `Analysis`: the serializable scan result

pub mod alerter;
pub mod analysis;
pub mod diff;
pub mod filter;
pub mod resource;
pub mod supplier;
