//! provision — incremental directory-to-group provisioning CLI.
//!
//! # Usage
//!
//! ```text
//! provision run [--config PATH] [--json]
//! provision daemon start|stop|status|run-now|logs [--config PATH]
//! provision cursor show|reset [--config PATH]
//! provision config check [--config PATH]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, cursor::CursorCommand, daemon::DaemonCommand, run::RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "provision",
    version,
    about = "Enroll newly licensed directory users into a group and invite them",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass in the foreground.
    Run(RunArgs),

    /// Manage the background daemon that runs on an interval.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },

    /// Inspect or reset the saved change-feed cursor.
    Cursor {
        #[command(subcommand)]
        command: CursorCommand,
    },

    /// Validate configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
        Commands::Cursor { command } => commands::cursor::run(command),
        Commands::Config { command } => commands::config::run(command),
    }
}
