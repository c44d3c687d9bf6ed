//! Similarity scoring - pure functions, no I/O
//!
//! A candidate is "the same change" as the source when its normalized title
//! and changed-file set overlap enough, and both come from the same tool.

use crate::automation::AutomationTool;
use crate::error::{Error, Result};
use crate::similarity::normalize::{normalize_paths, title_tokens};
use crate::types::PullRequestRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tolerance used when checking that weights sum to one
const WEIGHT_EPSILON: f64 = 1e-9;

/// Relative weight of the title and file signals in the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Weight of the title score
    pub title: f64,
    /// Weight of the file score
    pub files: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.5,
            files: 0.5,
        }
    }
}

impl SimilarityWeights {
    /// Weights must be finite, non-negative and sum to 1
    pub fn validate(&self) -> Result<()> {
        let finite = self.title.is_finite() && self.files.is_finite();
        if !finite || self.title < 0.0 || self.files < 0.0 {
            return Err(Error::Config(format!(
                "similarity weights must be non-negative numbers (title={}, files={})",
                self.title, self.files
            )));
        }
        if (self.title + self.files - 1.0).abs() > WEIGHT_EPSILON {
            return Err(Error::Config(format!(
                "similarity weights must sum to 1.0 (title={}, files={})",
                self.title, self.files
            )));
        }
        Ok(())
    }
}

/// Scores for one source/candidate comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Jaccard similarity of normalized title tokens
    pub title_score: f64,
    /// Jaccard similarity of normalized changed-file paths
    pub file_score: f64,
    /// Both PRs resolve to the same automation tool
    pub author_matches: bool,
    /// Combined score in [0, 1]; 0 when authors differ
    pub confidence: f64,
}

impl SimilarityScore {
    /// Match decision against a threshold
    pub fn is_match(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`; two empty sets are identical.
#[allow(clippy::cast_precision_loss)]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Title similarity on normalized token sets
pub fn title_similarity(source: &str, candidate: &str) -> f64 {
    jaccard(&title_tokens(source), &title_tokens(candidate))
}

/// File-change similarity on normalized path sets
pub fn file_similarity(source: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    jaccard(&normalize_paths(source), &normalize_paths(candidate))
}

/// Combine the three signals. Author mismatch vetoes the match outright.
pub fn combine(
    title_score: f64,
    file_score: f64,
    author_matches: bool,
    weights: SimilarityWeights,
) -> SimilarityScore {
    let confidence = if author_matches {
        weights
            .files
            .mul_add(file_score, weights.title * title_score)
            .clamp(0.0, 1.0)
    } else {
        0.0
    };

    SimilarityScore {
        title_score,
        file_score,
        author_matches,
        confidence,
    }
}

/// Upper bound on confidence from the titles alone (file score taken as 1).
///
/// When this misses the threshold the candidate cannot match whatever its
/// changed files are, so they need not be fetched.
pub fn title_can_match(
    source_title: &str,
    candidate_title: &str,
    weights: SimilarityWeights,
    threshold: f64,
) -> bool {
    combine(
        title_similarity(source_title, candidate_title),
        1.0,
        true,
        weights,
    )
    .is_match(threshold)
}

/// Score a candidate PR against the source PR
pub fn score_candidate(
    source: &PullRequestRecord,
    candidate: &PullRequestRecord,
    weights: SimilarityWeights,
) -> SimilarityScore {
    let source_tool = AutomationTool::for_pull_request(source);
    let author_matches =
        source_tool.is_some() && source_tool == AutomationTool::for_pull_request(candidate);

    combine(
        title_similarity(&source.title, &candidate.title),
        file_similarity(&source.changed_files, &candidate.changed_files),
        author_matches,
        weights,
    )
}
