//! The sort command: one full classify-and-deduplicate run.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::cli::Output;
use crate::config::{Platform, TidyboxConfig};
use crate::engine::{IntakeEngine, Outcome, RunReport};
use crate::exclude::ExclusionSet;
use crate::parallel::RunMode;
use crate::taxonomy::ExtensionMap;

#[derive(Args)]
pub struct SortArgs {
    /// Base directory for the roots (overrides config)
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Inbox directory (overrides config)
    #[arg(long, value_name = "DIR")]
    pub inbox: Option<PathBuf>,

    /// Sorted destination tree (overrides config)
    #[arg(long, value_name = "DIR")]
    pub sorted: Option<PathBuf>,

    /// Quarantine directory for duplicates (overrides config)
    #[arg(long, value_name = "DIR")]
    pub quarantine: Option<PathBuf>,

    /// Taxonomy document (overrides config)
    #[arg(long, value_name = "FILE")]
    pub taxonomy: Option<PathBuf>,

    /// Processing mode: auto (smart default), parallel, or sequential
    #[arg(long, value_enum)]
    pub mode: Option<RunMode>,

    /// Maximum worker threads (0 = auto-detect)
    #[arg(long)]
    pub max_threads: Option<usize>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON summary
    Json,
}

pub async fn execute(args: SortArgs, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let mut config = TidyboxConfig::load(config_path)?;

    // CLI overrides beat every config layer.
    if let Some(base) = args.base {
        config.roots.base = Some(base);
    }
    if let Some(inbox) = args.inbox {
        config.roots.inbox = inbox;
    }
    if let Some(sorted) = args.sorted {
        config.roots.sorted = sorted;
    }
    if let Some(quarantine) = args.quarantine {
        config.roots.quarantine = quarantine;
    }
    if let Some(taxonomy) = args.taxonomy {
        config.documents.taxonomy = taxonomy;
    }
    if let Some(mode) = args.mode {
        config.engine.mode = mode;
    }
    if let Some(max_threads) = args.max_threads {
        config.engine.max_threads = max_threads;
    }
    config.validate()?;

    let platform = Platform::current();
    let roots = config.roots.resolve(&platform);

    // No taxonomy, no run: classification is meaningless without it.
    let taxonomy = ExtensionMap::load(&config.documents.taxonomy)
        .context("cannot classify without a taxonomy document (try `tidybox config init`)")?;
    let exclusions = ExclusionSet::load(
        &config.documents.dir_exclusions,
        &config.documents.file_exclusions,
        platform.os_key,
    );

    output.verbose(&format!("inbox: {}", roots.inbox.display()));
    output.verbose(&format!("sorted: {}", roots.sorted.display()));
    output.verbose(&format!("quarantine: {}", roots.quarantine.display()));

    let engine = IntakeEngine::new(roots, taxonomy, exclusions, platform, config.engine.clone())?;

    let progress = match args.format {
        OutputFormat::Text => output.progress_bar(0, "Sorting inbox"),
        OutputFormat::Json => indicatif::ProgressBar::hidden(),
    };
    let report = engine.run(|done, total| {
        progress.set_length(total as u64);
        progress.set_position(done as u64);
    })?;
    progress.finish_and_clear();

    match args.format {
        OutputFormat::Json => print_json_report(&report)?,
        OutputFormat::Text => print_text_report(&report, output),
    }

    if report.stats.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn print_text_report(report: &RunReport, output: &Output) {
    for outcome in &report.outcomes {
        match outcome {
            Outcome::Classified { from, to, category } => {
                if output.is_verbose() {
                    output.info(&format!(
                        "{} → {} [{}]",
                        from.display(),
                        to.display(),
                        category
                    ));
                }
            }
            Outcome::Quarantined { from, to, .. } => {
                if output.is_verbose() {
                    output.info(&format!("{} → {} [duplicate]", from.display(), to.display()));
                }
            }
            Outcome::Skipped { path, reason } => {
                output.verbose(&format!("skipped {} ({})", path.display(), reason.describe()));
            }
            Outcome::DigestFailed { path, error } | Outcome::MoveFailed { path, error } => {
                output.error(&format!("{}: {}", path.display(), error));
            }
        }
    }

    for warning in &report.warnings {
        output.warning(warning);
    }

    let stats = &report.stats;
    output.header("Run Summary");
    output.stat("Indexed", stats.files_indexed);
    output.stat("Evaluated", stats.candidates);
    output.stat("Classified", stats.classified);
    output.stat("Quarantined", stats.quarantined);
    output.stat("Skipped", stats.skipped);
    if stats.errors > 0 {
        output.stat("Errors", stats.errors);
    }
    output.stat("Duration", format!("{}ms", stats.duration_ms));

    if stats.errors > 0 {
        output.error(&format!("{} file(s) could not be processed", stats.errors));
    } else {
        output.success("inbox sorted");
    }
}

fn print_json_report(report: &RunReport) -> Result<()> {
    use serde_json::json;

    let actions: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Classified { from, to, category } => Some(json!({
                "action": "classified",
                "from": from,
                "to": to,
                "category": category,
            })),
            Outcome::Quarantined { from, to, .. } => Some(json!({
                "action": "quarantined",
                "from": from,
                "to": to,
            })),
            Outcome::DigestFailed { path, error } | Outcome::MoveFailed { path, error } => {
                Some(json!({
                    "action": "error",
                    "path": path,
                    "error": error,
                }))
            }
            Outcome::Skipped { .. } => None,
        })
        .collect();

    let summary = json!({
        "actions": actions,
        "statistics": report.stats.clone(),
        "warnings": report.warnings.clone(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
