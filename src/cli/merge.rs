//! Merge command - find and merge matching automation PRs

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, arrow, check, hyperlink, spinner_style};
use anstream::println;
use dependamerge::auth::AuthSource;
use dependamerge::cancel::CancellationToken;
use dependamerge::config::ConfigOverrides;
use dependamerge::error::{Error, Result};
use dependamerge::progress::{NoopProgress, ProgressCallback};
use dependamerge::report::RunReport;
use dependamerge::run::{Discovery, discover, execute_run};
use dialoguer::Confirm;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Duration;

/// Options for the merge command
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Source PR URL or `owner/repo#number`
    pub reference: String,
    /// Explicit token (`--token`)
    pub token: Option<String>,
    /// Explicit config file (`--config`)
    pub config_path: Option<PathBuf>,
    /// Flags that override the config file
    pub overrides: ConfigOverrides,
    /// Show matches and prompt before any mutation
    pub confirm: bool,
    /// Print the report as JSON instead of text
    pub json: bool,
    /// Print every step
    pub verbose: bool,
}

/// Run the merge command
///
/// Returns the final report; fatal conditions come back as `Err`.
#[allow(clippy::future_not_send)]
pub async fn run_merge(options: MergeOptions, cancel: &CancellationToken) -> Result<RunReport> {
    // =========================================================================
    // Phase 1: GATHER - credentials, source PR, organization scan
    // =========================================================================

    let ctx = CommandContext::new(
        &options.reference,
        options.token.as_deref(),
        options.config_path.as_deref(),
        &options.overrides,
    )
    .await?;

    let progress: Box<dyn ProgressCallback> = if options.json {
        Box::new(NoopProgress)
    } else if options.verbose {
        Box::new(CliProgress::verbose())
    } else {
        Box::new(CliProgress::compact())
    };

    if !options.json {
        let via = match ctx.auth_source {
            AuthSource::Flag => "--token",
            AuthSource::EnvVar => "environment",
            AuthSource::Cli => "gh CLI",
        };
        println!(
            "{}",
            format!("Authenticated as {} (via {via})", ctx.user).muted()
        );
    }

    let spinner = (!options.json).then(|| {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(format!(
            "Searching {} for similar PRs...",
            ctx.source.key.repo.owner.emphasis()
        ));
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    });

    let discovery = discover(
        ctx.platform.as_ref(),
        &ctx.source.key,
        &ctx.config,
        &NoopProgress,
    )
    .await;

    let discovery = match discovery {
        Ok(discovery) => {
            if let Some(spinner) = &spinner {
                spinner.finish_with_message(format!(
                    "{} Searched {} repositories ({} candidates)",
                    check(),
                    discovery.repositories_scanned,
                    discovery.candidates_evaluated
                ));
            }
            discovery
        }
        Err(e) => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            return Err(e);
        }
    };

    // =========================================================================
    // Phase 2: REVIEW - show what was found
    // =========================================================================

    if !options.json {
        print_source(&discovery);
        print_matches(&discovery, ctx.config.threshold);
    }

    if options.confirm && !ctx.config.dry_run && discovery.match_count() > 0 {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Approve and merge {} PR(s) plus the source PR?",
                discovery.match_count()
            ))
            .default(false)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?;
        if !proceed {
            println!("{}", "Aborted".muted());
            return Ok(RunReport {
                dry_run: ctx.config.dry_run,
                candidates_evaluated: discovery.candidates_evaluated,
                ..RunReport::default()
            });
        }
        println!();
    }

    // =========================================================================
    // Phase 3: EXECUTE - drive each match, then the source PR
    // =========================================================================

    if !options.json && discovery.match_count() > 0 {
        let verb = if ctx.config.dry_run { "Simulating" } else { "Merging" };
        println!(
            "{} {}",
            verb.emphasis(),
            format!("{} PR(s)...", discovery.match_count() + 1).accent()
        );
    }

    let report = execute_run(
        &discovery,
        ctx.platform.as_ref(),
        &ctx.config,
        progress.as_ref(),
        cancel,
    )
    .await;

    if options.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::Internal(format!("Failed to serialize report: {e}")))?;
        println!("{json}");
    } else {
        print_summary(&report);
    }

    Ok(report)
}

fn print_source(discovery: &Discovery) {
    let source = &discovery.source;
    println!();
    println!("{}:", "Source PR".emphasis());
    println!(
        "  {} {}",
        hyperlink(&source.key.to_string(), &source.html_url).accent(),
        source.title
    );
    println!(
        "  {} {} {}",
        discovery.tool.name().muted(),
        arrow(),
        format!("{} changed file(s)", source.changed_files.len()).muted()
    );
    println!();
}

fn print_matches(discovery: &Discovery, threshold: f64) {
    if discovery.match_count() == 0 {
        println!(
            "{}",
            format!("No similar PRs found (threshold {threshold:.2}).").muted()
        );
    } else {
        println!("{}:", "Matching PRs".emphasis());
        for (record, score) in discovery.matches() {
            println!(
                "  {:>5.1}%  {}  {}",
                score.confidence * 100.0,
                hyperlink(&record.key.to_string(), &record.html_url).accent(),
                record.title
            );
            println!(
                "          {}",
                format!(
                    "title {:.2}, files {:.2}",
                    score.title_score, score.file_score
                )
                .muted()
            );
        }
    }

    for failure in discovery.failures() {
        println!(
            "  {} {} {}",
            "✗".warn(),
            failure.target.accent(),
            failure.reason.muted()
        );
    }
    println!();
}

fn print_summary(report: &RunReport) {
    let counts = report.counts;
    println!();
    if report.dry_run {
        println!("{}", "Dry run complete (no changes made)".emphasis());
    } else if counts.failed == 0 {
        println!("{} Run complete!", check());
    } else {
        println!("{} Run partially complete", "⚠️".warn());
    }

    println!(
        "   Matched: {}  Merged: {}  Already merged: {}  Skipped: {}  Failed: {}",
        counts.matched.accent(),
        counts.merged.success(),
        counts.already_merged,
        counts.skipped.warn(),
        counts.failed.warn()
    );

    let non_merged: Vec<_> = report.non_merged().collect();
    if !non_merged.is_empty() {
        println!();
        for outcome in non_merged {
            println!(
                "   {} {}: {}",
                outcome.status.to_string().warn(),
                outcome.target.accent(),
                outcome.reason.muted()
            );
        }
    }

    if report.dry_run && counts.merged > 0 {
        println!();
        println!("{}", "Run without --dry-run to execute.".muted());
    }
}
