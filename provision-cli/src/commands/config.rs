//! `provision config check` — validate settings without touching any service.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use provision_core::Settings;
use provision_renderer::InvitationRenderer;

use super::print_rows;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Load and validate settings, then print them with secrets redacted.
    Check(ConfigCheckArgs),
}

#[derive(Args, Debug)]
pub struct ConfigCheckArgs {
    /// Configuration file (default: ~/.provision/config.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Check(args) => check(args),
    }
}

fn check(args: ConfigCheckArgs) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("invalid configuration")?;
    InvitationRenderer::with_overrides(settings.template_dir.as_deref())
        .context("invalid invitation templates")?;

    print_rows(settings.redacted());
    println!("{} configuration is valid", "✓".green().bold());
    Ok(())
}
