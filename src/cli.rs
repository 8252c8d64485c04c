use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::add::{self, AddOptions};
use crate::commands::archive::{self, ArchiveOptions};
use crate::commands::id::{self, IdOptions};
use crate::commands::remove::{self, RemoveOptions};
use crate::commands::restore::{self, RestoreOptions};
use crate::commands::{CommandContext, CommandReport, verify};
use crate::folio::config::{load_config, unrecognized_env_keys};
use crate::folio::paths::{resolve_paths, resolve_site_root};
use crate::logging;

/// Keep the portfolio registry and the project pages' navigation in step.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about, long_about = None)]
pub struct Cli {
    /// Site root holding the registry, the project folders and imgs/
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print the command report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new project to the web page
    Add {
        /// Folder name of the new project
        name: String,
        /// One-line project description
        description: String,
    },
    /// Remove a project from active view but do not delete files
    Archive { name: String },
    /// Return a project to an active state from the archive
    Restore { name: String },
    /// Remove all files associated with a project
    Remove {
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print a project id given the folder name
    Id { name: String },
    /// Check that the active projects form one closed ring
    Verify,
}

fn render_text(report: &CommandReport) -> String {
    let mut out = format!(
        "{}: {}\n",
        report.command,
        if report.ok { "ok" } else { "failed" }
    );
    for detail in &report.details {
        out.push_str(&format!("  {detail}\n"));
    }
    for issue in &report.issues {
        out.push_str(&format!("  issue: {issue}\n"));
    }
    out
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let site_root = resolve_site_root(cli.root)?;
    let config = load_config(&site_root)?;
    logging::init(&config.logging);
    for key in unrecognized_env_keys() {
        tracing::warn!(%key, "ignoring unrecognized FOLIO_ variable");
    }

    let paths = resolve_paths(site_root, &config);
    let ctx = CommandContext { paths, config };

    let report = match cli.command {
        Command::Add { name, description } => add::run(&ctx, &AddOptions { name, description })?,
        Command::Archive { name } => archive::run(&ctx, &ArchiveOptions { name })?,
        Command::Restore { name } => restore::run(&ctx, &RestoreOptions { name })?,
        Command::Remove { name, yes } => remove::run(&ctx, &RemoveOptions { name, yes })?,
        Command::Id { name } => id::run(&ctx, &IdOptions { name })?,
        Command::Verify => verify::run(&ctx)?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    if !report.ok {
        anyhow::bail!("{} found {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
