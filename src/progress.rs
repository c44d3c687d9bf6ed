//! Progress reporting hooks
//!
//! The library never prints. Callers plug in a [`ProgressCallback`] to render
//! phases, messages and outcomes however they like.

use crate::report::MergeOutcome;
use async_trait::async_trait;

/// Receives progress events during a run
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A new phase started (e.g. "Scanning organization")
    async fn on_phase(&self, _phase: &str) {}

    /// Free-form status message
    async fn on_message(&self, message: &str);

    /// A PR (or repository) reached its terminal outcome
    async fn on_outcome(&self, _outcome: &MergeOutcome) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
