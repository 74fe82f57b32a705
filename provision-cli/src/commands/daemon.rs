//! `provision daemon` — background scheduler lifecycle.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use provision_daemon::paths::{socket_path, stderr_log_path, stdout_log_path};
use provision_daemon::{request_run, request_status, request_stop, start_blocking, DaemonError};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run the daemon in the foreground (scheduler + socket server).
    Start(DaemonStartArgs),
    /// Request graceful daemon shutdown over the Unix socket.
    Stop,
    /// Query daemon runtime status over the Unix socket.
    Status,
    /// Ask a running daemon to run now and wait for the report.
    RunNow,
    /// Print recent daemon log lines.
    Logs(DaemonLogsArgs),
}

#[derive(Args, Debug)]
pub struct DaemonStartArgs {
    /// Configuration file (default: ~/.provision/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DaemonLogsArgs {
    /// Number of trailing lines to show.
    #[arg(long, default_value_t = 100)]
    pub lines: usize,

    /// Show only warnings and errors.
    #[arg(long)]
    pub errors_only: bool,
}

pub fn run(command: DaemonCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;

    match command {
        DaemonCommand::Start(args) => {
            start_blocking(&home, args.config).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request_stop(&home) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => {
                println!("daemon is not running");
            }
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => match request_status(&home) {
            Ok(status) => print_json(&status)?,
            Err(DaemonError::DaemonNotRunning { .. }) => {
                print_json(&serde_json::json!({
                    "running": false,
                    "socket": socket_path(&home).display().to_string(),
                }))?;
            }
            Err(err) => return Err(err).context("failed to query daemon status"),
        },
        DaemonCommand::RunNow => {
            let summary = request_run(&home).context("daemon run failed")?;
            print_json(&summary)?;
        }
        DaemonCommand::Logs(args) => {
            if !args.errors_only {
                print_tail(&stdout_log_path(&home), args.lines)
                    .context("failed to read daemon log")?;
            }
            print_tail(&stderr_log_path(&home), args.lines)
                .context("failed to read daemon error log")?;
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to render daemon JSON")?
    );
    Ok(())
}

fn print_tail(path: &Path, lines: usize) -> Result<()> {
    if !path.exists() {
        println!("log file not found: {}", path.display());
        return Ok(());
    }

    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut tail = VecDeque::<String>::with_capacity(lines);
    for line in reader.lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if lines == 0 {
            continue;
        }
        if tail.len() == lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    println!("==> {} <==", path.display());
    for line in tail {
        println!("{line}");
    }
    Ok(())
}
