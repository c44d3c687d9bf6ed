//! CLI command implementations

pub mod context;
pub mod merge;
pub mod style;

use anstream::println;
use async_trait::async_trait;
use dependamerge::progress::ProgressCallback;
use dependamerge::report::{MergeOutcome, OutcomeStatus};
use style::{Stylize, check};

/// Progress printer for the terminal
pub struct CliProgress {
    verbose: bool,
}

impl CliProgress {
    /// Outcome lines only
    pub const fn compact() -> Self {
        Self { verbose: false }
    }

    /// Outcome lines plus every step message
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: &str) {
        if self.verbose {
            println!("{}", format!("{phase}...").muted());
        }
    }

    async fn on_message(&self, message: &str) {
        println!("  {}", message.muted());
    }

    async fn on_outcome(&self, outcome: &MergeOutcome) {
        let marker = match outcome.status {
            OutcomeStatus::Merged if outcome.simulated => "~".accent(),
            OutcomeStatus::Merged => check(),
            OutcomeStatus::AlreadyMerged => "=".muted(),
            OutcomeStatus::Skipped => "-".warn(),
            OutcomeStatus::Failed => "✗".warn(),
        };
        println!(
            "{marker} {} {}",
            outcome.target.accent(),
            outcome.reason.muted()
        );
    }
}
