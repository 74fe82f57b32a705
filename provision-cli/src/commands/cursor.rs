//! `provision cursor` — inspect or clear the persisted change-feed cursor.
//!
//! Only storage settings are needed; no directory credentials are used.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use provision_core::Settings;
use provision_graph::open_cursor_store;
use provision_sync::{fingerprint, CursorStore};

use super::print_rows;

#[derive(Subcommand, Debug)]
pub enum CursorCommand {
    /// Show where the cursor lives and when it was saved.
    Show(CursorArgs),
    /// Delete the cursor; the next run performs a full sync.
    Reset(CursorArgs),
}

#[derive(Args, Debug)]
pub struct CursorArgs {
    /// Configuration file (default: ~/.provision/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(command: CursorCommand) -> Result<()> {
    match command {
        CursorCommand::Show(args) => show(args),
        CursorCommand::Reset(args) => reset(args),
    }
}

fn show(args: CursorArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("invalid configuration")?;
    let store = open_cursor_store(&settings);
    let document = store.inspect().context("failed to read cursor")?;

    let mut rows = vec![
        ("storage", settings.storage.to_string()),
        ("container", settings.container.clone()),
        ("blob", store.key().to_string()),
    ];
    match document {
        Some(doc) => {
            rows.push(("fingerprint", fingerprint(&doc.cursor)));
            rows.push((
                "saved at",
                doc.saved_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string()),
            ));
            print_rows(rows);
        }
        None => {
            print_rows(rows);
            println!("{} no cursor saved; the next run is a full sync", "·".bright_black());
        }
    }
    Ok(())
}

fn reset(args: CursorArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("invalid configuration")?;
    let store = open_cursor_store(&settings);
    if store.clear().context("failed to delete cursor")? {
        println!("{} cursor deleted; the next run is a full sync", "✓".green().bold());
    } else {
        println!("{} no cursor saved; nothing to reset", "·".bright_black());
    }
    Ok(())
}
