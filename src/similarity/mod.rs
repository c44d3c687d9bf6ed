//! Similarity engine
//!
//! Decides whether a candidate PR elsewhere in the organization carries the
//! same change as the source PR. Everything here is pure and deterministic.

mod normalize;
mod score;

pub use normalize::{normalize_path, normalize_paths, normalize_title, title_tokens};
pub use score::{
    SimilarityScore, SimilarityWeights, combine, file_similarity, jaccard, score_candidate,
    title_can_match, title_similarity,
};
