//! Shared command context
//!
//! Resolves everything a run needs before any network mutation: the source
//! reference, the credential, the platform client and the configuration.

use dependamerge::auth::{AuthSource, get_github_auth};
use dependamerge::config::{ConfigOverrides, MergeConfig, load_file_config};
use dependamerge::error::{Error, Result};
use dependamerge::platform::{GitHubService, PlatformService, SourceReference, parse_pr_reference};
use std::path::Path;
use tracing::debug;

/// Setup shared by every run
pub struct CommandContext {
    /// Parsed source PR reference
    pub source: SourceReference,
    /// Platform service
    pub platform: Box<dyn PlatformService>,
    /// Authenticated login
    pub user: String,
    /// Where the token came from
    pub auth_source: AuthSource,
    /// Resolved run configuration
    pub config: MergeConfig,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// - Parse the PR reference
    /// - Load and merge configuration (file, then CLI overrides)
    /// - Resolve and validate the token
    pub async fn new(
        reference: &str,
        token: Option<&str>,
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let source = parse_pr_reference(reference)?;

        let file = load_file_config(config_path)?;
        let config = MergeConfig::resolve(&file, overrides)?;

        let auth = get_github_auth(token).await?;
        let platform = GitHubService::new(&auth.token, source.host.clone())?;

        let user = platform
            .current_user()
            .await
            .map_err(|e| match e {
                Error::Auth(_) => e,
                other => Error::Auth(format!("token validation failed: {other}")),
            })?;
        debug!(%user, source = ?auth.source, "authenticated");

        Ok(Self {
            source,
            platform: Box::new(platform),
            user,
            auth_source: auth.source,
            config,
        })
    }
}
