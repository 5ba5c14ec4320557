//! Sync engine: reconciles an external todo batch against the board.
//!
//! Each item is matched to an existing task (by previously-bound external
//! id, then by exact truncated-title equality) or created fresh; the
//! conflict resolver decides the winning state and the engine issues the
//! same create/move operations the task store exposes to every other
//! caller — it never touches storage rows directly. Items are processed
//! sequentially because later items may match bindings established by
//! earlier ones; one item's failure is recorded and never aborts the batch.

mod resolver;

pub use resolver::{Winner, resolve, status_rank};

use serde::{Deserialize, Serialize};

use crate::config::{CancelledPolicy, ConflictStrategy};
use crate::context::AppContext;
use crate::errors::{BoardError, Result};
use crate::models::{Priority, SyncResult, Task, TodoStatus};
use crate::tasks::NewTask;

/// One external batch, as received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoBatch {
    pub todos: Vec<TodoItem>,
}

/// One item of the external todo list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub priority: Priority,
}

enum Outcome {
    Created,
    Moved,
    Skipped,
}

pub struct SyncEngine<'a> {
    ctx: &'a AppContext,
    strategy: ConflictStrategy,
    cancelled_policy: CancelledPolicy,
}

impl<'a> SyncEngine<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            ctx,
            strategy: ctx.config.conflict_strategy,
            cancelled_policy: ctx.config.cancelled_policy,
        }
    }

    /// Run one reconciliation pass over the batch.
    ///
    /// Never fails as a whole: per-item errors are recorded against the
    /// (truncated) item title and the remaining items still run. `success`
    /// is false when any item failed.
    pub fn run(&self, batch: &TodoBatch) -> SyncResult {
        let mut result = SyncResult::default();
        for item in &batch.todos {
            match self.sync_item(item) {
                Ok(Outcome::Created) => result.created += 1,
                Ok(Outcome::Moved) => result.moved += 1,
                Ok(Outcome::Skipped) => result.skipped += 1,
                Err(err) => {
                    let label = truncate_title(&item.content, 64);
                    result.errors.push(format!("{}: {}", label, err));
                }
            }
        }
        result.success = result.errors.is_empty();
        tracing::info!(
            created = result.created,
            moved = result.moved,
            skipped = result.skipped,
            errors = result.errors.len(),
            "sync batch processed"
        );
        result
    }

    fn sync_item(&self, item: &TodoItem) -> Result<Outcome> {
        let external_id = item.id.trim();
        if external_id.is_empty() {
            return Err(BoardError::validation("todo id must not be empty"));
        }
        let content = item.content.trim();
        if content.is_empty() {
            return Err(BoardError::validation("todo content must not be empty"));
        }
        if content.chars().count() > 500 {
            return Err(BoardError::validation("todo content exceeds 500 characters"));
        }

        // Policy check runs before any matching or resolution.
        if item.status == TodoStatus::Cancelled && self.cancelled_policy == CancelledPolicy::Skip {
            tracing::debug!(todo = %external_id, "cancelled item dropped");
            return Ok(Outcome::Skipped);
        }

        let title = truncate_title(content, self.ctx.config.max_title_length);
        let tasks = self.ctx.tasks();
        let existing = match tasks.find_by_external_id(external_id)? {
            Some(task) => Some(task),
            None => tasks.find_by_title(&title)?,
        };

        let target_column = self.column_for(item.status)?;
        match existing {
            None => {
                tasks.add_task(NewTask {
                    title,
                    column_id: Some(target_column),
                    creator: Some(self.ctx.config.default_actor.clone()),
                    priority: Some(item.priority),
                    external_id: Some(external_id.to_string()),
                    ..Default::default()
                })?;
                Ok(Outcome::Created)
            }
            Some(task) => {
                // A title match establishes the external-id binding for
                // future runs, whichever side wins below.
                let task = if task.external_id.as_deref() == Some(external_id) {
                    task
                } else {
                    tasks.bind_external_id(&task.id, external_id)?
                };

                let board_status = self.board_status(&task)?;
                match resolve(self.strategy, item.status, board_status) {
                    Winner::Board => Ok(Outcome::Skipped),
                    Winner::Todo if task.column_id == target_column => Ok(Outcome::Skipped),
                    Winner::Todo => {
                        tasks.move_task(&task.id, &target_column, false)?;
                        Ok(Outcome::Moved)
                    }
                }
            }
        }
    }

    /// Fixed status-to-column mapping. The cancelled arm is only reached
    /// under the `backlog` policy.
    fn column_for(&self, status: TodoStatus) -> Result<String> {
        let config = &self.ctx.config;
        match status {
            TodoStatus::Pending => Ok(config.default_column.clone()),
            TodoStatus::InProgress => Ok(config.in_progress_column.clone()),
            TodoStatus::Completed => {
                let terminal = self.ctx.boards().terminal_column()?.ok_or_else(|| {
                    BoardError::validation("board has no terminal column to complete into")
                })?;
                Ok(terminal.id)
            }
            TodoStatus::Cancelled => Ok(config.backlog_column.clone()),
        }
    }

    /// Map the board task's current column back to an equivalent status:
    /// terminal → completed, the canonical in-progress column →
    /// in_progress, anything else → pending.
    fn board_status(&self, task: &Task) -> Result<TodoStatus> {
        if let Some(terminal) = self.ctx.boards().terminal_column()? {
            if task.column_id == terminal.id {
                return Ok(TodoStatus::Completed);
            }
        }
        if task.column_id == self.ctx.config.in_progress_column {
            return Ok(TodoStatus::InProgress);
        }
        Ok(TodoStatus::Pending)
    }
}

/// Truncate to at most `max` characters on a char boundary, then trim.
fn truncate_title(content: &str, max: usize) -> String {
    content.trim().chars().take(max).collect::<String>().trim().to_string()
}
