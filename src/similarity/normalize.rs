//! Title and path normalization
//!
//! Titles lose everything that varies between otherwise identical bot PRs:
//! version numbers, commit hashes and dates. Matches are replaced with a
//! space so that stripping never glues two neighbouring tokens together,
//! which keeps normalization idempotent.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// ISO-8601 dates, optionally with a time part (input is lowercased first)
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b\d{4}-\d{2}-\d{2}",
        r"(?:t\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:z|[+-]\d{2}:?\d{2})?)?\b"
    ))
        .unwrap_or_else(|e| unreachable!("date pattern is valid: {e}"))
});

// 1.2.3, 1.2.3.4, v1.2.3-rc.1, v1.2
static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bv?\d+\.\d+\.\d+(?:\.\d+)*(?:-[0-9a-z]+(?:\.[0-9a-z]+)*)?\b|\bv\d+\.\d+\b")
        .unwrap_or_else(|e| unreachable!("version pattern is valid: {e}"))
});

// abbreviated or full commit hashes
static COMMIT_HASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9a-f]{7,40}\b")
        .unwrap_or_else(|e| unreachable!("hash pattern is valid: {e}"))
});

/// Normalize a PR title for comparison.
///
/// `"Bump lodash from 4.17.20 to 4.17.21"` becomes `"bump lodash from to"`.
/// Stripping repeats until nothing changes, so `normalize_title` is a fixpoint.
pub fn normalize_title(title: &str) -> String {
    let mut current = strip_variable_tokens(title);
    loop {
        let next = strip_variable_tokens(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_variable_tokens(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_dates = DATE.replace_all(&lowered, " ");
    let without_versions = VERSION.replace_all(&without_dates, " ");
    let without_hashes = COMMIT_HASH.replace_all(&without_versions, " ");

    without_hashes.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-split token set of a normalized title
pub fn title_tokens(title: &str) -> BTreeSet<String> {
    normalize_title(title)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a changed-file path: lowercase, forward slashes, no `.` or
/// empty segments (`./a//b` and `A/b` both become `a/b`).
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .to_lowercase()
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a whole changed-file set, dropping paths that normalize to nothing
pub fn normalize_paths<'a, I>(paths: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    paths
        .into_iter()
        .map(|p| normalize_path(p))
        .filter(|p| !p.is_empty())
        .collect()
}
