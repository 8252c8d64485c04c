use anyhow::Result;

use crate::commands::{CommandContext, CommandReport};
use crate::folio::service::Outcome;

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub name: String,
}

pub fn run(ctx: &CommandContext, opts: &RestoreOptions) -> Result<CommandReport> {
    let mut service = ctx.open_service()?;
    let mut report = CommandReport::new("restore");

    match service.restore(&opts.name)? {
        Outcome::Applied(change) => report.change(&change),
        Outcome::Unchanged { id } => {
            report.detail(format!("id={id}"));
            report.detail(format!("project {} is already active", opts.name));
        }
    }

    Ok(report)
}
