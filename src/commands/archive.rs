use anyhow::Result;

use crate::commands::{CommandContext, CommandReport};
use crate::folio::service::Outcome;

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub name: String,
}

pub fn run(ctx: &CommandContext, opts: &ArchiveOptions) -> Result<CommandReport> {
    let mut service = ctx.open_service()?;
    let mut report = CommandReport::new("archive");

    match service.archive(&opts.name)? {
        Outcome::Applied(change) => report.change(&change),
        Outcome::Unchanged { id } => {
            report.detail(format!("id={id}"));
            report.detail(format!("project {} has already been archived", opts.name));
        }
    }

    Ok(report)
}
