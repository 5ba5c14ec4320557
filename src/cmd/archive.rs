//! Archive management commands.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::path::Path;

use taskdeck::context::AppContext;
use taskdeck::tasks::ArchiveCriteria;

pub fn cmd_archive(
    project_dir: &Path,
    ids: Option<Vec<String>>,
    column: Option<String>,
    older_than_days: Option<i64>,
) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let affected = ctx.tasks().archive_tasks(&ArchiveCriteria {
        task_ids: ids,
        column_id: column,
        older_than: older_than_days.map(|days| Utc::now() - Duration::days(days)),
    })?;
    println!("Archived {} task(s).", affected.len());
    for id in &affected {
        println!("  {}", id);
    }
    Ok(())
}

pub fn cmd_restore(project_dir: &Path, id: &str, column: Option<&str>) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let task = ctx.tasks().restore_task(id, column)?;
    println!("Restored {} to '{}' (v{})", task.id, task.column_id, task.version);
    Ok(())
}

pub fn cmd_search_archive(project_dir: &Path, query: &str, limit: i64, offset: i64) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let (tasks, total) = ctx.tasks().search_archive(query, limit, offset)?;

    if tasks.is_empty() {
        println!("No archived tasks match.");
        return Ok(());
    }
    println!();
    for task in &tasks {
        let archived_at = task
            .archived_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<26} {:<26} {}", task.id, archived_at, task.title);
    }
    println!();
    println!(
        "Showing {} of {} match(es) (offset {})",
        tasks.len(),
        total,
        offset
    );
    Ok(())
}

pub fn cmd_purge(project_dir: &Path, older_than_days: Option<i64>) -> Result<()> {
    let ctx = AppContext::open(project_dir)?;
    let cutoff = older_than_days.map(|days| Utc::now() - Duration::days(days));
    let removed = ctx.tasks().purge_archive(cutoff)?;
    println!("Purged {} archived task(s).", removed);
    Ok(())
}
