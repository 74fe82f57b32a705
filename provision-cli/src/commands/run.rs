//! `provision run` — one reconciliation pass in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use provision_graph::{execute, log_failure};
use provision_sync::{EnrollmentOutcome, RunReport};

use super::{print_rows, separator};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file (default: ~/.provision/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        provision_daemon::init_stderr();

        let report = match execute(self.config.as_deref(), Utc::now()) {
            Ok(report) => report,
            Err(err) => {
                log_failure(&err);
                return Err(err).context("provisioning run failed");
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize run report")?
            );
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &RunReport) {
    println!(
        "{} {} run finished in {} ms",
        "✓".green().bold(),
        report.mode,
        report.duration_ms
    );
    println!("{}", separator());
    print_rows(report.summary_rows());

    let failures: Vec<_> = report
        .enrollment
        .entries
        .iter()
        .filter_map(|(user, outcome)| match outcome {
            EnrollmentOutcome::Failed { error, permission } => Some((user, error, *permission)),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        println!("{}", separator());
        for (user, error, permission) in failures {
            let marker = if permission { "✗ denied".red() } else { "✗ failed".yellow() };
            println!("  {marker}  {user}: {error}");
        }
    }

    if !report.cursor_saved() {
        println!("Cursor not advanced; the next run resumes from the previous checkpoint.");
    }
}
