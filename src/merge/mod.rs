//! Merge orchestration
//!
//! Two-part pattern:
//! 1. Assess - decide the next transition from a snapshot (pure, testable)
//! 2. Execute - fetch, update, approve and merge (effectful)

mod execute;
mod plan;

pub use execute::MergeOrchestrator;
pub use plan::{Assessment, MergeConfidence, assess, reasons};
