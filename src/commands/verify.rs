use anyhow::Result;

use crate::commands::{CommandContext, CommandReport};

pub fn run(ctx: &CommandContext) -> Result<CommandReport> {
    let service = ctx.open_service()?;
    let mut report = CommandReport::new("verify");

    let registry = service.registry();
    report.detail(format!(
        "registry={}",
        service.paths().registry_file.display()
    ));
    report.detail(format!("projects={}", registry.projects.len()));
    report.detail(format!("active={}", registry.active_count()));

    for issue in service.verify() {
        report.issue(issue);
    }

    Ok(report)
}
