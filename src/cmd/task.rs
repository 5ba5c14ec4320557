//! Task lifecycle commands: add, list, show, move, done, update, delete.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::str::FromStr;

use taskdeck::context::AppContext;
use taskdeck::errors::BoardError;
use taskdeck::models::{Priority, Task, TaskFilter};
use taskdeck::tasks::{NewTask, TaskUpdate};

pub struct AddArgs {
    pub title: String,
    pub description: Option<String>,
    pub column: Option<String>,
    pub creator: Option<String>,
    pub priority: Option<String>,
    pub depends_on: Vec<String>,
    pub files: Vec<String>,
    pub labels: Vec<String>,
}

pub fn cmd_add(project_dir: &Path, args: AddArgs) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let priority = args.priority.as_deref().map(parse_priority).transpose()?;
    let task = ctx.tasks().add_task(NewTask {
        title: args.title,
        description: args.description,
        column_id: args.column,
        creator: args.creator,
        priority,
        depends_on: args.depends_on,
        files: args.files,
        labels: args.labels,
        external_id: None,
    })?;
    println!(
        "Created {} in '{}': {}",
        console::style(&task.id).cyan(),
        task.column_id,
        task.title
    );
    Ok(())
}

pub struct ListArgs {
    pub column: Option<String>,
    pub creator: Option<String>,
    pub assignee: Option<String>,
    pub blocked: bool,
    pub archived: bool,
    pub json: bool,
}

pub fn cmd_list(project_dir: &Path, args: ListArgs) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    ctx.boards().board()?;
    let tasks = ctx.tasks().list_tasks(&TaskFilter {
        column_id: args.column,
        creator: args.creator,
        assignee: args.assignee,
        blocked_only: args.blocked,
        include_archived: args.archived,
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    println!();
    println!(
        "{:<26} {:<14} {:<8} {:<4} Title",
        "ID", "Column", "Priority", "Ver"
    );
    for task in &tasks {
        let mut line = format!(
            "{:<26} {:<14} {:<8} {:<4} {}",
            task.id, task.column_id, task.priority, task.version, task.title
        );
        if task.archived {
            line = format!("{}", console::style(line).dim());
        } else if task.blocked_reason.is_some() {
            line = format!("{} {}", line, console::style("[blocked]").yellow());
        }
        println!("{}", line);
    }
    println!();
    println!("{} task(s)", tasks.len());
    Ok(())
}

pub fn cmd_show(project_dir: &Path, id: &str, json: bool) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let task = ctx
        .tasks()
        .get_task(id)?
        .ok_or_else(|| BoardError::TaskNotFound { id: id.to_string() })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
        return Ok(());
    }
    print_task(&task);

    let links = ctx.links();
    let blockers = links.get_blockers(id)?;
    let blocking = links.get_blocking(id)?;
    if !blockers.is_empty() {
        println!("Blocked by:   {}", blockers.join(", "));
    }
    if !blocking.is_empty() {
        println!("Blocking:     {}", blocking.join(", "));
    }
    println!();
    Ok(())
}

fn print_task(task: &Task) {
    println!();
    println!("{}  {}", console::style(&task.id).cyan(), task.title);
    println!("Column:       {} (position {})", task.column_id, task.position);
    println!("Priority:     {}", task.priority);
    println!("Creator:      {}", task.creator);
    if let Some(assignee) = &task.assignee {
        println!("Assignee:     {}", assignee);
    }
    if let Some(description) = &task.description {
        println!("Description:  {}", description);
    }
    if let Some(parent) = &task.parent_id {
        println!("Parent:       {}", parent);
    }
    if !task.depends_on.is_empty() {
        println!("Depends on:   {}", task.depends_on.join(", "));
    }
    if !task.files.is_empty() {
        println!("Files:        {}", task.files.join(", "));
    }
    if !task.labels.is_empty() {
        println!("Labels:       {}", task.labels.join(", "));
    }
    if let Some(reason) = &task.blocked_reason {
        println!("Blocked:      {}", console::style(reason).yellow());
    }
    if let Some(due) = task.due_at {
        println!("Due:          {}", due.to_rfc3339());
    }
    println!("Version:      {}", task.version);
    println!("Created:      {}", task.created_at.to_rfc3339());
    if let Some(started) = task.started_at {
        println!("Started:      {}", started.to_rfc3339());
    }
    if let Some(completed) = task.completed_at {
        println!("Completed:    {}", completed.to_rfc3339());
    }
    if task.archived {
        println!("{}", console::style("Archived").dim());
    }
}

pub fn cmd_move(project_dir: &Path, id: &str, column: &str, force: bool) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let task = ctx.tasks().move_task(id, column, force)?;
    println!("Moved {} to '{}' (v{})", task.id, task.column_id, task.version);
    Ok(())
}

pub fn cmd_done(project_dir: &Path, id: &str, force: bool) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let terminal = ctx
        .boards()
        .terminal_column()?
        .ok_or_else(|| BoardError::validation("board has no terminal column"))?;
    let task = ctx.tasks().move_task(id, &terminal.id, force)?;
    println!(
        "{} {} is done",
        console::style("✓").green(),
        task.id
    );
    Ok(())
}

pub struct UpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub files: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub blocked_reason: Option<String>,
    pub clear_blocked: bool,
    pub parent: Option<String>,
    pub clear_parent: bool,
    pub expected_version: Option<i64>,
}

pub fn cmd_update(project_dir: &Path, id: &str, args: UpdateArgs) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let priority = args.priority.as_deref().map(parse_priority).transpose()?;
    let due_at = args.due.as_deref().map(parse_rfc3339).transpose()?;
    let task = ctx.tasks().update_task(
        id,
        TaskUpdate {
            title: args.title,
            description: args.description,
            assignee: args.assignee,
            priority,
            due_at,
            files: args.files,
            labels: args.labels,
            blocked_reason: args.blocked_reason,
            clear_blocked_reason: args.clear_blocked,
            parent_id: args.parent,
            clear_parent: args.clear_parent,
        },
        args.expected_version,
    )?;
    println!("Updated {} (v{})", task.id, task.version);
    Ok(())
}

pub fn cmd_delete(project_dir: &Path, id: &str) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    ctx.tasks().delete_task(id)?;
    println!("Deleted {}", id);
    Ok(())
}

fn parse_priority(s: &str) -> Result<Priority> {
    Priority::from_str(s).map_err(|e| anyhow!(e))
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 date: {}", s))
}
