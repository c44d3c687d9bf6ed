//! dependamerge CLI entry point

mod cli;

use anstream::eprintln;
use clap::Parser;
use cli::merge::{MergeOptions, run_merge};
use cli::style::Stylize;
use dependamerge::cancel::CancellationToken;
use dependamerge::config::ConfigOverrides;
use dependamerge::types::MergeMethod;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "DEPENDAMERGE_LOG";

/// Find open automation PRs matching a source PR across its organization,
/// then approve and merge them all
#[derive(Parser, Debug)]
#[command(name = "dependamerge", version, about, long_about = None)]
struct Cli {
    /// Source PR: `https://github.com/owner/repo/pull/N` or `owner/repo#N`
    #[arg(value_name = "PR_URL")]
    pr_url: String,

    /// Show what would be merged without approving or merging anything
    #[arg(long)]
    dry_run: bool,

    /// Minimum similarity confidence for a match (0.0-1.0, default 0.8)
    #[arg(long)]
    threshold: Option<f64>,

    /// Merge method
    #[arg(long, value_enum)]
    merge_method: Option<MergeMethod>,

    /// Update branches that are behind their base before merging
    #[arg(long)]
    fix: bool,

    /// GitHub token (defaults to GITHUB_TOKEN, GH_TOKEN or `gh auth token`)
    #[arg(long)]
    token: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Repositories fetched in parallel while searching
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Show the matches and ask before merging
    #[arg(long)]
    confirm: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; remaining PRs will be skipped");
                cancel.cancel();
            }
        });
    }

    let options = MergeOptions {
        reference: cli.pr_url,
        token: cli.token,
        config_path: cli.config,
        overrides: ConfigOverrides {
            threshold: cli.threshold,
            merge_method: cli.merge_method,
            dry_run: cli.dry_run,
            fix: cli.fix,
            fetch_concurrency: cli.concurrency,
        },
        confirm: cli.confirm,
        json: cli.json,
        verbose: cli.verbose,
    };

    match run_merge(options, &cancel).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "Error:".error());
            ExitCode::FAILURE
        }
    }
}
