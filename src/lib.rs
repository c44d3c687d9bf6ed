//! dependamerge - merge the same automation PR across a GitHub organization
//!
//! Given one PR opened by a maintenance bot (Dependabot, Renovate,
//! pre-commit.ci, ...), find the equivalent open PRs in every other
//! repository of the organization, then approve and merge them all.
//!
//! # Architecture
//!
//! - [`automation`] - classify PR authors as known automation tools
//! - [`scan`] - list repositories and fetch candidate PRs
//! - [`similarity`] - pure scoring of a candidate against the source
//! - [`merge`] - per-PR state machine (assess, update, approve, merge)
//! - [`report`] - ordered outcomes and counts
//! - [`run`] - discovery followed by sequential orchestration
//! - [`platform`] - the GitHub client behind the [`platform::PlatformService`] trait

pub mod auth;
pub mod automation;
pub mod cancel;
pub mod config;
pub mod error;
pub mod merge;
pub mod platform;
pub mod progress;
pub mod report;
pub mod run;
pub mod scan;
pub mod similarity;
pub mod types;
