//! Organization scanning and candidate fetching

mod candidates;
mod repos;

pub use candidates::{CandidateFetch, CandidateFilter, RepositoryCandidates, fetch_candidates};
pub use repos::scan_organization;
