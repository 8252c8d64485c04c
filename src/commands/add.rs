use anyhow::Result;

use crate::commands::{CommandContext, CommandReport};

#[derive(Debug, Clone)]
pub struct AddOptions {
    pub name: String,
    pub description: String,
}

pub fn run(ctx: &CommandContext, opts: &AddOptions) -> Result<CommandReport> {
    let mut service = ctx.open_service()?;
    let mut report = CommandReport::new("add");

    let change = service.add(&opts.name, &opts.description)?;
    report.detail(format!("name={}", opts.name));
    report.change(&change);

    Ok(report)
}
