//! The `reconcile` subcommand.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use rostermail_core::enrich::{EnrichStats, GitHubProfileProvider, MailEnricher};
use rostermail_core::errors::InputError;
use rostermail_core::models::{MatchResult, MatchStatus};
use rostermail_core::report::{summarize, ReportMode};
use rostermail_core::ReconcileEngine;

use crate::style;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Roster file (github-manager data.yaml).
    pub roster: PathBuf,

    /// Directory dump (output of `udm users/user list`).
    pub directory: Option<PathBuf>,

    /// Print only the deduplicated list of email addresses.
    #[arg(short, long)]
    pub mail: bool,

    /// Write the report here instead of stdout.
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// File holding a GitHub personal access token; enables enrichment.
    #[arg(short, long)]
    pub pat: Option<PathBuf>,

    /// Do not print the summary to stderr.
    #[arg(long)]
    pub no_summary: bool,
}

pub async fn run(engine: &ReconcileEngine, args: ReconcileArgs) -> Result<()> {
    // Credential problems must surface before any member is processed.
    let token = engine
        .config()
        .enrich
        .resolve_token(args.pat.as_deref())
        .context("failed to read GitHub token")?;
    let provider = token
        .map(|token| GitHubProfileProvider::from_config(&engine.config().enrich, token))
        .transpose()
        .context("GitHub token is not usable")?;

    let inputs = engine
        .load_inputs(&args.roster, args.directory.as_deref())
        .context("failed to load inputs")?;
    let mut results = engine.reconcile(&inputs.members, inputs.directory);

    let enrich_stats = match provider {
        Some(provider) => Some(enrich_with_progress(&mut results, provider).await),
        None => {
            info!("no GitHub token configured, skipping public email enrichment");
            None
        }
    };

    let mode = if args.mail {
        ReportMode::MailOnly
    } else {
        ReportMode::Table
    };
    let reporter = engine.reporter();
    match args.outfile {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            reporter
                .write(&results, mode, BufWriter::new(file))
                .context("failed to write report")?;
            info!(path = %path.display(), rows = results.len(), "report written");
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            reporter
                .write(&results, mode, &mut lock)
                .context("failed to write report")?;
            lock.flush()?;
        }
    }

    if !args.no_summary {
        print_summary(&results, &inputs.skipped, enrich_stats.as_ref());
    }
    Ok(())
}

async fn enrich_with_progress(
    results: &mut [MatchResult],
    provider: GitHubProfileProvider,
) -> (EnrichStats, bool) {
    let pending = results.iter().filter(|r| r.emails.is_empty()).count() as u64;
    let bar = ProgressBar::new(pending);
    if let Ok(bar_style) = ProgressStyle::with_template("{spinner:.blue} {pos}/{len} {wide_msg}") {
        bar.set_style(bar_style);
    }

    let mut enricher = MailEnricher::new(provider);
    for result in results.iter_mut() {
        let lookup = result.emails.is_empty();
        if lookup {
            bar.set_message(format!("looking up {}", result.member.handle));
        }
        enricher.enrich(result).await;
        if lookup {
            bar.inc(1);
        }
    }
    bar.finish_and_clear();
    if enricher.is_halted() {
        warn!(
            remaining = enricher.stats().halted,
            "GitHub refused further lookups, remaining members were not enriched"
        );
    }

    (enricher.stats().clone(), enricher.is_halted())
}

fn print_summary(
    results: &[MatchResult],
    skipped: &[InputError],
    enrich: Option<&(EnrichStats, bool)>,
) {
    let summary = summarize(results);

    eprintln!();
    eprintln!("{}", style::header(&format!("Reconciled {} members", summary.members)));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Status", "Members"]);
    for status in MatchStatus::ALL {
        table.add_row(vec![
            Cell::new(style::status(status)),
            Cell::new(summary.count(status)),
        ]);
    }
    table.add_row(vec![Cell::new("with email"), Cell::new(summary.with_email)]);
    eprintln!("{}", table);

    if !skipped.is_empty() {
        eprintln!(
            "{}",
            style::warn(&format!("{} malformed input entries skipped", skipped.len()))
        );
    }

    if let Some((stats, halted)) = enrich {
        eprintln!(
            "  Enrichment: {} lookups, {} added, {} failed",
            stats.lookups, stats.added, stats.failed
        );
        if *halted {
            eprintln!(
                "{}",
                style::warn(&format!(
                    "enrichment stopped early; {} members were not looked up",
                    stats.halted
                ))
            );
        }
    }

    let ambiguous: Vec<&MatchResult> = results
        .iter()
        .filter(|r| r.status() == MatchStatus::Ambiguous)
        .collect();
    if ambiguous.is_empty() {
        eprintln!("{}", style::success("no ambiguous matches"));
    } else {
        eprintln!();
        eprintln!("{}", style::header("Needs manual resolution"));
        for result in ambiguous {
            let accounts: Vec<&str> = result
                .candidates()
                .iter()
                .map(|record| record.account.as_str())
                .collect();
            eprintln!(
                "  {} {} {}",
                result.member.handle,
                style::dim(&format!("({})", result.member.full_name)),
                accounts.join(", ")
            );
        }
    }
    eprintln!();
}
