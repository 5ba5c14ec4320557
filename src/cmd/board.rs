//! Board initialization, summary, and reset commands.

use anyhow::Result;
use std::path::Path;

use taskdeck::context::AppContext;

pub fn cmd_init(project_dir: &Path, name: Option<&str>) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let default_name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "board".to_string());
    let board = ctx.boards().initialize(name.unwrap_or(&default_name))?;

    println!();
    println!("Initialized board '{}'", board.name);
    println!();
    for column in ctx.boards().columns()? {
        let mut extras = Vec::new();
        if let Some(limit) = column.wip_limit {
            extras.push(format!("wip {}", limit));
        }
        if column.terminal {
            extras.push("terminal".to_string());
        }
        let suffix = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        println!("  {:<14} {}{}", column.id, column.name, suffix);
    }
    println!();
    Ok(())
}

pub fn cmd_status(project_dir: &Path) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let board = ctx.boards().board()?;
    let tasks = ctx.tasks().list_tasks(&taskdeck::models::TaskFilter {
        include_archived: true,
        ..Default::default()
    })?;

    println!();
    println!("Board: {}", board.name);
    println!();
    println!("{:<14} {:<8} {:<8} Name", "Column", "Live", "Limit");
    for column in ctx.boards().columns()? {
        let live = tasks
            .iter()
            .filter(|t| t.column_id == column.id && !t.archived)
            .count();
        let limit = column
            .wip_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if column.terminal { " (terminal)" } else { "" };
        println!("{:<14} {:<8} {:<8} {}{}", column.id, live, limit, column.name, marker);
    }
    let archived = tasks.iter().filter(|t| t.archived).count();
    println!();
    println!(
        "{} live task(s), {} archived",
        tasks.len() - archived,
        archived
    );
    println!();
    Ok(())
}

pub fn cmd_reset(project_dir: &Path, force: bool) -> Result<()> {
    use dialoguer::Confirm;

    let ctx = AppContext::open(project_dir)?;
    ctx.boards().board()?;

    if !force {
        let confirm = Confirm::new()
            .with_prompt("This will permanently delete every task on the board. Are you sure?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirm {
            println!("Reset cancelled.");
            return Ok(());
        }
    }

    let removed = ctx.tasks().reset_board()?;
    println!("Removed {} task(s).", removed);
    Ok(())
}
