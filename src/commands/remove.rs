use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use crate::commands::{CommandContext, CommandReport};
use crate::folio::service::{Confirmation, Removal};

#[derive(Debug, Clone)]
pub struct RemoveOptions {
    pub name: String,
    pub yes: bool,
}

fn parse_answer(answer: &str) -> Confirmation {
    if answer.trim().eq_ignore_ascii_case("y") {
        Confirmation::Granted
    } else {
        Confirmation::Declined
    }
}

fn prompt(name: &str) -> Result<Confirmation> {
    let mut stderr = io::stderr();
    write!(stderr, "Remove all files and folders in project {name}? (y/n) ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(parse_answer(&answer))
}

pub fn run(ctx: &CommandContext, opts: &RemoveOptions) -> Result<CommandReport> {
    let mut service = ctx.open_service()?;
    let mut report = CommandReport::new("remove");

    // Unknown names fail before anyone is asked to confirm.
    service.lookup(&opts.name)?;
    let confirmation = if opts.yes {
        Confirmation::Granted
    } else {
        prompt(&opts.name)?
    };

    match service.remove(&opts.name, confirmation)? {
        Removal::Declined { id } => {
            report.detail(format!("id={id}"));
            report.detail("deletion aborted");
        }
        Removal::Removed {
            id,
            archived,
            deleted,
        } => {
            report.detail(format!("id={id}"));
            if let Some(change) = archived {
                for page in &change.patched {
                    report.detail(format!("patched={}", page.display()));
                }
            }
            for path in &deleted {
                report.detail(format!("deleted={}", path.display()));
            }
        }
    }

    Ok(report)
}
