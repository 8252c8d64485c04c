use anyhow::Result;

use crate::commands::{CommandContext, CommandReport};

#[derive(Debug, Clone)]
pub struct IdOptions {
    pub name: String,
}

pub fn run(ctx: &CommandContext, opts: &IdOptions) -> Result<CommandReport> {
    let service = ctx.open_service()?;
    let mut report = CommandReport::new("id");

    let id = service.lookup(&opts.name)?;
    report.detail(format!("id={id}"));

    Ok(report)
}
