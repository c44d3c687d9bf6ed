//! Run configuration
//!
//! `MergeConfig` is built once from built-in defaults, an optional TOML file
//! and CLI overrides (in that order of precedence), validated, and then only
//! ever passed around by shared reference.

use crate::error::{Error, Result};
use crate::similarity::SimilarityWeights;
use crate::types::MergeMethod;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default similarity threshold
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default number of concurrent read-only repository fetches
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Default review body for approvals
pub const DEFAULT_APPROVAL_MESSAGE: &str = "Auto-approved by dependamerge";

/// Default base delay between re-fetches while waiting on GitHub
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Directory name under the user config dir
const CONFIG_DIR: &str = "dependamerge";

/// Config filename
const CONFIG_FILE: &str = "config.toml";

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Minimum confidence for a candidate to match
    pub threshold: f64,
    /// Merge method passed to the platform
    pub merge_method: MergeMethod,
    /// Simulate all mutating calls
    pub dry_run: bool,
    /// Update stale branches before merging
    pub auto_fix: bool,
    /// Title/file weighting of the confidence score
    pub weights: SimilarityWeights,
    /// Worker count for read-only candidate fetches (1 = sequential)
    pub fetch_concurrency: usize,
    /// Body of the approval review
    pub approval_message: String,
    /// Base delay between re-fetches of a PR whose mergeability or head is
    /// still settling (grows exponentially)
    pub poll_interval: Duration,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            merge_method: MergeMethod::default(),
            dry_run: false,
            auto_fix: false,
            weights: SimilarityWeights::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            approval_message: DEFAULT_APPROVAL_MESSAGE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl MergeConfig {
    /// Check every field is within range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        self.weights.validate()?;
        if self.fetch_concurrency == 0 {
            return Err(Error::Config(
                "fetch concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Layer file values and CLI overrides over the defaults, then validate
    pub fn resolve(file: &FileConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = Self::default();
        let file_weights = file.weights.map(|w| SimilarityWeights {
            title: w.title,
            files: w.files,
        });

        let config = Self {
            threshold: overrides
                .threshold
                .or(file.threshold)
                .unwrap_or(defaults.threshold),
            merge_method: overrides
                .merge_method
                .or(file.merge_method)
                .unwrap_or(defaults.merge_method),
            dry_run: overrides.dry_run,
            auto_fix: overrides.fix || file.fix.unwrap_or(false),
            weights: file_weights.unwrap_or(defaults.weights),
            fetch_concurrency: overrides
                .fetch_concurrency
                .or(file.fetch_concurrency)
                .unwrap_or(defaults.fetch_concurrency),
            approval_message: file
                .approval_message
                .clone()
                .unwrap_or(defaults.approval_message),
            poll_interval: file
                .poll_interval_ms
                .map_or(defaults.poll_interval, Duration::from_millis),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--threshold`
    pub threshold: Option<f64>,
    /// `--merge-method`
    pub merge_method: Option<MergeMethod>,
    /// `--dry-run`
    pub dry_run: bool,
    /// `--fix`
    pub fix: bool,
    /// `--concurrency`
    pub fetch_concurrency: Option<usize>,
}

/// `[weights]` table of the config file
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FileWeights {
    /// Title weight
    pub title: f64,
    /// Files weight
    pub files: f64,
}

/// On-disk configuration, every key optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Similarity threshold
    pub threshold: Option<f64>,
    /// Merge method
    pub merge_method: Option<MergeMethod>,
    /// Enable branch updates
    pub fix: Option<bool>,
    /// Read-only fetch worker count
    pub fetch_concurrency: Option<usize>,
    /// Approval review body
    pub approval_message: Option<String>,
    /// Base re-check delay in milliseconds
    pub poll_interval_ms: Option<u64>,
    /// Score weighting
    pub weights: Option<FileWeights>,
}

/// Default config file location (`~/.config/dependamerge/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the config file.
///
/// An explicit path must exist. The default path is optional and yields an
/// empty `FileConfig` when absent.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(FileConfig::default()),
        },
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(FileConfig::default());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    parse_file_config(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Parse config file contents
pub fn parse_file_config(content: &str) -> std::result::Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}
