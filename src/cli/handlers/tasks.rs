// src/cli/handlers/tasks.rs

use crate::{
    cli::{args::TasksArgs, handlers::commons},
    core::workspace::ProjectId,
};
use anyhow::{Result, anyhow};
use colored::Colorize;

/// Lists the finalized tasks of one project.
pub fn handle(args: TasksArgs) -> Result<()> {
    let mut loaded = commons::load(&args.workspace)?;
    let workspace = &mut loaded.workspace;
    loaded.configurator.pre_synthesize(workspace)?;
    loaded.configurator.synthesize(workspace)?;

    let id = match &args.project {
        Some(name) => workspace
            .find(name)
            .ok_or_else(|| anyhow!("Project '{}' is not defined in this workspace.", name))?,
        None => ProjectId::ROOT,
    };
    let project = workspace.project(id);

    println!("\nTasks of '{}':", project.name.cyan());
    if project.tasks.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for task in project.tasks.iter() {
        let lock = if task.is_locked() { " (locked)" } else { "" };
        println!(
            "  {}{} {}",
            task.name().bold(),
            lock.yellow(),
            task.description().unwrap_or("").dimmed()
        );
        for step in task.steps() {
            println!("    {} {}", "→".blue(), step.green());
        }
    }
    for (key, value) in project.tasks.env() {
        println!("  {} {}={}", "env".dimmed(), key, value);
    }
    Ok(())
}
