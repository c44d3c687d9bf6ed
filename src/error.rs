//! Error types for dependamerge

use crate::types::PrKey;
use thiserror::Error;

/// Errors raised by the matching and merge pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or rejected credential
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Source PR author is not a known automation tool
    #[error("source PR {pr} is not from a recognized automation tool (author: {author})")]
    NotAutomation {
        /// Source PR
        pr: PrKey,
        /// Author login that failed classification
        author: String,
    },

    /// PR reference could not be parsed
    #[error("invalid pull request reference: {0}")]
    InvalidReference(String),

    /// Invalid run configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// GitHub API returned an error or unexpected payload
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitHub answered with a server error (5xx)
    #[error("GitHub unavailable: {0}")]
    Unavailable(String),

    /// Error surfaced by octocrab
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Raw HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic platform collaborator failure
    #[error("platform error: {0}")]
    Platform(String),

    /// Anything that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error must abort the run before any mutation.
    ///
    /// Everything else degrades to a per-repository or per-PR outcome.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Auth(_) | Self::NotAutomation { .. } | Self::InvalidReference(_) | Self::Config(_)
        )
    }

    /// Whether a read-only call may be retried: transport failures and 5xx only
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Octocrab(octocrab::Error::GitHub { source, .. }) => {
                source.status_code.is_server_error()
            }
            // Anything but an API response failed below the HTTP layer
            Self::Octocrab(_) => true,
            _ => false,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
