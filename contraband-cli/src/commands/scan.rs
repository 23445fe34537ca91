//! `contraband scan` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use contraband_core::config::ContrabandConfig;
use contraband_core::types::{IssueSource, ScanReport};
use contraband_matcher::MatcherCache;
use contraband_scanner::{ScanOrchestrator, ScannerConfig};

use crate::cli::ScanArgs;
use crate::collector::{self, CollectOptions};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// CLI flags override the loaded configuration before it is validated again.
pub async fn execute(
    args: ScanArgs,
    mut config: ContrabandConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    if let Some(workers) = args.workers {
        config.pool.worker_count = workers;
    }
    if let Some(policy) = &args.queue_policy {
        config.pool.queue_policy = policy.to_ascii_lowercase();
    }
    config.validate()?;

    let scanner_config = ScannerConfig::from_core(&config);
    let orchestrator = ScanOrchestrator::new(scanner_config, Arc::new(MatcherCache::new()))?;

    let files = collector::collect(
        &args.path,
        CollectOptions {
            include_hidden_dirs: args.hidden,
        },
    )?;
    info!(path = %args.path.display(), files = files.len(), "starting scan");

    let report = orchestrator.scan(&args.path, files).await?;
    writer.render(&ScanSummary { report: &report })?;

    if report.has_issues() && !args.no_fail {
        return Err(CliError::IssuesFound(report.issues.len()));
    }
    Ok(())
}

/// Scan report payload. JSON output is the report itself.
#[derive(Serialize)]
#[serde(transparent)]
pub struct ScanSummary<'a> {
    pub report: &'a ScanReport,
}

impl Render for ScanSummary<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let report = self.report;
        writeln!(w, "Scan: {}", report.target.bold())?;
        writeln!(w, "Files scanned: {}", report.files_scanned)?;
        writeln!(w, "Archive entries scanned: {}", report.entries_scanned)?;
        writeln!(w)?;

        if report.issues.is_empty() {
            writeln!(w, "{}", "No issues found.".green())?;
        } else {
            let header = format!("Issues: {}", report.issues.len());
            writeln!(w, "{}", header.red().bold())?;
            for issue in &report.issues {
                let location = match (&issue.archive, issue.source) {
                    (Some(archive), _) => format!("{}!/{}", archive, issue.location),
                    (None, IssueSource::Repository) => format!("{} (repository)", issue.location),
                    (None, IssueSource::File) => issue.location.clone(),
                };
                writeln!(w, "  [{}] {}", issue.check.yellow(), location)?;
                writeln!(w, "      {}", issue.message)?;
                let matched: Vec<&str> = issue.matched.iter().map(String::as_str).collect();
                writeln!(w, "      matched: {}", matched.join(", ").dimmed())?;
            }
        }

        if !report.warnings.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", format!("Warnings: {}", report.warnings.len()).yellow())?;
            for warning in &report.warnings {
                writeln!(
                    w,
                    "  {:<18} {}: {}",
                    warning.kind.to_string(),
                    warning.location,
                    warning.message
                )?;
            }
        }

        Ok(())
    }
}
