//! Pull request reference parsing

use crate::error::{Error, Result};
use crate::types::PrKey;
use url::Url;

/// Parsed source PR reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    /// The PR being used as a template
    pub key: PrKey,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// Parse a PR reference.
///
/// Accepts web URLs (`https://github.com/owner/repo/pull/42`, optionally
/// followed by `/files`, `/commits`, ... and a trailing slash) and the
/// shorthand `owner/repo#42`.
pub fn parse_pr_reference(reference: &str) -> Result<SourceReference> {
    let reference = reference.trim();
    if reference.contains("://") {
        parse_pr_url(reference)
    } else {
        parse_shorthand(reference)
    }
}

fn parse_pr_url(raw: &str) -> Result<SourceReference> {
    let invalid = || Error::InvalidReference(raw.to_string());

    let url = Url::parse(raw).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();

    let segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty())
        .collect();

    // owner / repo / pull / number [/ files | commits | checks ...]
    let pull_index = segments
        .iter()
        .position(|s| *s == "pull")
        .ok_or_else(invalid)?;
    if pull_index < 2 {
        return Err(invalid());
    }

    let owner = segments[pull_index - 2];
    let repo = segments[pull_index - 1];
    let number = segments
        .get(pull_index + 1)
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(invalid)?;

    let host = match host.as_str() {
        "github.com" | "www.github.com" => None,
        _ => Some(host),
    };

    Ok(SourceReference {
        key: PrKey::new(owner, repo, number),
        host,
    })
}

fn parse_shorthand(raw: &str) -> Result<SourceReference> {
    let invalid = || Error::InvalidReference(raw.to_string());

    let (repo_part, number) = raw.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = repo_part.split_once('/').ok_or_else(invalid)?;
    let number = number
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(invalid)?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }

    Ok(SourceReference {
        key: PrKey::new(owner, repo, number),
        host: None,
    })
}
