//! Task store: CRUD and lifecycle transitions over task rows.
//!
//! All column changes funnel through [`TaskService::move_task`]; every
//! successful mutation increments the task `version` by exactly 1 and is
//! guarded by a compare-and-swap on that version, so a stale writer gets a
//! CONFLICT instead of silently losing another actor's update.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use ulid::Ulid;

use crate::board::BoardDirectory;
use crate::config::BoardConfig;
use crate::db::BoardDb;
use crate::errors::{BoardError, Result};
use crate::models::{Column, Priority, Task, TaskFilter};

/// Actor names: letter-leading, then letters/digits/`_`/`-`, at most 50
/// characters total. Stored case-folded.
static ACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,49}$").expect("valid actor regex"));

/// Input for task creation. Unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub column_id: Option<String>,
    pub creator: Option<String>,
    pub priority: Option<Priority>,
    pub depends_on: Vec<String>,
    pub files: Vec<String>,
    pub labels: Vec<String>,
    pub external_id: Option<String>,
}

/// Partial field update. `None` leaves a field untouched; the `clear_*`
/// flags null out their optional counterparts.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub due_at: Option<DateTime<Utc>>,
    pub files: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    pub blocked_reason: Option<String>,
    pub clear_blocked_reason: bool,
    pub parent_id: Option<String>,
    pub clear_parent: bool,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.priority.is_none()
            && self.due_at.is_none()
            && self.files.is_none()
            && self.labels.is_none()
            && self.blocked_reason.is_none()
            && !self.clear_blocked_reason
            && self.parent_id.is_none()
            && !self.clear_parent
    }
}

/// Archive selection. Given criteria combine with AND; at least one is
/// required.
#[derive(Debug, Clone, Default)]
pub struct ArchiveCriteria {
    pub task_ids: Option<Vec<String>>,
    pub column_id: Option<String>,
    /// Tasks whose last update precedes this cutoff.
    pub older_than: Option<DateTime<Utc>>,
}

impl ArchiveCriteria {
    pub fn is_empty(&self) -> bool {
        self.task_ids.is_none() && self.column_id.is_none() && self.older_than.is_none()
    }
}

pub struct TaskService<'a> {
    db: &'a BoardDb,
    config: &'a BoardConfig,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a BoardDb, config: &'a BoardConfig) -> Self {
        Self { db, config }
    }

    fn boards(&self) -> BoardDirectory<'a> {
        BoardDirectory::new(self.db, self.config)
    }

    // ── Creation and reads ────────────────────────────────────────────

    pub fn add_task(&self, new: NewTask) -> Result<Task> {
        let title = self.validate_title(&new.title)?;
        let creator = validate_actor(
            new.creator
                .as_deref()
                .unwrap_or(&self.config.default_actor),
        )?;

        let column_id = new
            .column_id
            .unwrap_or_else(|| self.config.default_column.clone());
        let column = match self.db.get_column(&column_id)? {
            Some(c) => c,
            None => {
                return Err(BoardError::validation(format!(
                    "column '{}' does not exist",
                    column_id
                )));
            }
        };

        let now = Utc::now();
        let mut task = Task {
            id: Ulid::new().to_string(),
            title,
            description: new.description,
            column_id: column.id.clone(),
            position: self.db.next_position(&column.id)?,
            priority: new.priority.unwrap_or(Priority::Medium),
            creator,
            assignee: None,
            parent_id: None,
            depends_on: new.depends_on,
            files: new.files,
            labels: new.labels,
            blocked_reason: None,
            external_id: new.external_id,
            due_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            archived: false,
            archived_at: None,
        };
        // Creation directly into a stamped column counts as entering it.
        self.stamp_column_entry(&mut task, &column, now);

        self.db.insert_task(&task)?;
        tracing::debug!(task = %task.id, column = %task.column_id, "task created");
        Ok(task)
    }

    /// Lookup by id. Absence is `None`, not an error; callers decide whether
    /// it is fatal.
    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.db.get_task(id)
    }

    /// Lookup by the external todo-list id this task is bound to.
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Task>> {
        self.db.get_task_by_external_id(external_id)
    }

    /// First non-archived task with this exact title, in board order. Tasks
    /// with duplicate titles are indistinguishable here.
    pub fn find_by_title(&self, title: &str) -> Result<Option<Task>> {
        self.db.get_task_by_title(title)
    }

    /// Record the external todo-list id a task corresponds to. A no-op when
    /// the binding already holds; otherwise a mutation like any other.
    pub fn bind_external_id(&self, id: &str, external_id: &str) -> Result<Task> {
        let mut task = self.require_task(id)?;
        if task.external_id.as_deref() == Some(external_id) {
            return Ok(task);
        }
        let expected = task.version;
        task.external_id = Some(external_id.to_string());
        task.version += 1;
        task.updated_at = Utc::now();
        self.commit(task, expected)
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let tasks = self.db.list_tasks(filter.include_archived)?;
        Ok(tasks
            .into_iter()
            .filter(|t| {
                filter
                    .column_id
                    .as_ref()
                    .is_none_or(|c| &t.column_id == c)
                    && filter.creator.as_ref().is_none_or(|c| &t.creator == c)
                    && filter
                        .assignee
                        .as_ref()
                        .is_none_or(|a| t.assignee.as_ref() == Some(a))
                    && (!filter.blocked_only || t.blocked_reason.is_some())
            })
            .collect())
    }

    pub fn delete_task(&self, id: &str) -> Result<()> {
        if !self.db.delete_task(id)? {
            return Err(BoardError::TaskNotFound { id: id.to_string() });
        }
        tracing::debug!(task = %id, "task deleted");
        Ok(())
    }

    // ── Lifecycle transitions ─────────────────────────────────────────

    /// Move a task to another column, re-appending it at the end of that
    /// column's position order.
    ///
    /// The single transition function all column changes funnel through.
    /// The WIP count read and the move write are separate statements, so two
    /// concurrent movers in different processes can both pass the check and
    /// jointly exceed the limit by one.
    pub fn move_task(&self, id: &str, target_column_id: &str, force: bool) -> Result<Task> {
        let mut task = self.require_task(id)?;
        if task.archived {
            return Err(BoardError::validation(format!(
                "task {} is archived; restore it before moving",
                id
            )));
        }
        let target = self.boards().get_column(target_column_id)?;

        if let Some(limit) = target.wip_limit {
            if !force {
                let live = self.db.live_count(&target.id)?;
                if live >= i64::from(limit) {
                    return Err(BoardError::validation(format!(
                        "column '{}' is at its WIP limit ({})",
                        target.id, limit
                    )));
                }
            }
        }

        let now = Utc::now();
        let expected = task.version;
        task.position = self.db.next_position(&target.id)?;
        task.column_id = target.id.clone();
        self.stamp_column_entry(&mut task, &target, now);
        task.version += 1;
        task.updated_at = now;
        let task = self.commit(task, expected)?;
        tracing::debug!(task = %task.id, column = %task.column_id, version = task.version, "task moved");
        Ok(task)
    }

    /// Apply partial field updates behind the optimistic-concurrency gate.
    ///
    /// With `expected_version` set, a mismatch against the stored version is
    /// a CONFLICT and nothing changes.
    pub fn update_task(
        &self,
        id: &str,
        updates: TaskUpdate,
        expected_version: Option<i64>,
    ) -> Result<Task> {
        let mut task = self.require_task(id)?;
        if let Some(expected) = expected_version {
            if expected != task.version {
                return Err(BoardError::VersionConflict {
                    id: id.to_string(),
                    expected,
                    stored: task.version,
                });
            }
        }
        if updates.is_empty() {
            return Err(BoardError::validation("no fields to update"));
        }

        if let Some(title) = updates.title {
            task.title = self.validate_title(&title)?;
        }
        if let Some(description) = updates.description {
            task.description = if description.is_empty() {
                None
            } else {
                Some(description)
            };
        }
        if let Some(assignee) = updates.assignee {
            task.assignee = Some(validate_actor(&assignee)?);
        }
        if let Some(priority) = updates.priority {
            task.priority = priority;
        }
        if let Some(due_at) = updates.due_at {
            task.due_at = Some(due_at);
        }
        if let Some(files) = updates.files {
            task.files = files;
        }
        if let Some(labels) = updates.labels {
            task.labels = labels;
        }
        if updates.clear_blocked_reason {
            task.blocked_reason = None;
        } else if let Some(reason) = updates.blocked_reason {
            task.blocked_reason = Some(reason);
        }
        if updates.clear_parent {
            task.parent_id = None;
        } else if let Some(parent_id) = updates.parent_id {
            self.validate_parent(id, &parent_id)?;
            task.parent_id = Some(parent_id);
        }

        let expected = task.version;
        task.version += 1;
        task.updated_at = Utc::now();
        self.commit(task, expected)
    }

    // ── Archive management ────────────────────────────────────────────

    /// Archive every live task matching all given criteria. Returns the
    /// affected ids.
    pub fn archive_tasks(&self, criteria: &ArchiveCriteria) -> Result<Vec<String>> {
        if criteria.is_empty() {
            return Err(BoardError::validation(
                "at least one archive criterion is required",
            ));
        }
        if let Some(ids) = &criteria.task_ids {
            for id in ids {
                if self.db.get_task(id)?.is_none() {
                    return Err(BoardError::TaskNotFound { id: id.clone() });
                }
            }
        }

        let id_set: Option<HashSet<&str>> = criteria
            .task_ids
            .as_ref()
            .map(|ids| ids.iter().map(String::as_str).collect());
        let matched: Vec<String> = self
            .db
            .list_tasks(false)?
            .into_iter()
            .filter(|t| {
                id_set
                    .as_ref()
                    .is_none_or(|ids| ids.contains(t.id.as_str()))
                    && criteria
                        .column_id
                        .as_ref()
                        .is_none_or(|c| &t.column_id == c)
                    && criteria.older_than.is_none_or(|cutoff| t.updated_at < cutoff)
            })
            .map(|t| t.id)
            .collect();

        let affected = self.db.archive_tasks(&matched, Utc::now())?;
        tracing::debug!(count = affected.len(), "tasks archived");
        Ok(affected)
    }

    /// Bring an archived task back to the board, optionally into a different
    /// column. Non-lifecycle fields are left untouched.
    pub fn restore_task(&self, id: &str, target_column_id: Option<&str>) -> Result<Task> {
        let mut task = self.require_task(id)?;
        if !task.archived {
            return Err(BoardError::validation(format!(
                "task {} is not archived",
                id
            )));
        }

        let now = Utc::now();
        if let Some(column_id) = target_column_id {
            let target = self.boards().get_column(column_id)?;
            task.position = self.db.next_position(&target.id)?;
            task.column_id = target.id.clone();
            self.stamp_column_entry(&mut task, &target, now);
        }
        task.archived = false;
        task.archived_at = None;
        let expected = task.version;
        task.version += 1;
        task.updated_at = now;
        self.commit(task, expected)
    }

    /// Text search over archived tasks. Empty query matches all archived
    /// rows. Returns a page plus the total count.
    pub fn search_archive(&self, query: &str, limit: i64, offset: i64) -> Result<(Vec<Task>, i64)> {
        self.db.search_archived(query, limit.max(1), offset.max(0))
    }

    /// Hard-delete archived rows, optionally only those archived before the
    /// cutoff. Returns the number removed.
    pub fn purge_archive(&self, older_than: Option<DateTime<Utc>>) -> Result<usize> {
        self.db.purge_archived(older_than)
    }

    /// Hard-delete every task regardless of archive state. Irreversible;
    /// callers gate this behind an explicit confirmation.
    pub fn reset_board(&self) -> Result<usize> {
        let n = self.db.delete_all_tasks()?;
        tracing::info!(count = n, "board reset");
        Ok(n)
    }

    // ── Ranking support ───────────────────────────────────────────────

    /// Live tasks eligible for ranking: not in the terminal column, no
    /// blocked-reason, and no unresolved dependencies. A dependency is
    /// resolved once its task is completed; a dependency on a hard-deleted
    /// task no longer holds anything up.
    pub fn actionable_tasks(&self) -> Result<Vec<Task>> {
        let all = self.db.list_tasks(true)?;
        let resolved: HashSet<&str> = all
            .iter()
            .filter(|t| t.completed_at.is_some())
            .map(|t| t.id.as_str())
            .collect();
        let known: HashSet<&str> = all.iter().map(|t| t.id.as_str()).collect();
        let terminal = self.boards().terminal_column()?;

        Ok(all
            .iter()
            .filter(|t| {
                !t.archived
                    && terminal.as_ref().is_none_or(|c| t.column_id != c.id)
                    && t.is_actionable(|dep| resolved.contains(dep) || !known.contains(dep))
            })
            .cloned()
            .collect())
    }

    // ── Internals ─────────────────────────────────────────────────────

    fn require_task(&self, id: &str) -> Result<Task> {
        self.db
            .get_task(id)?
            .ok_or_else(|| BoardError::TaskNotFound { id: id.to_string() })
    }

    /// First entry into the terminal column stamps `completed_at`; first
    /// entry into the canonical in-progress column stamps `started_at`.
    /// Neither stamp is ever overwritten or cleared by later moves.
    fn stamp_column_entry(&self, task: &mut Task, column: &Column, now: DateTime<Utc>) {
        if column.terminal && task.completed_at.is_none() {
            task.completed_at = Some(now);
        }
        if column.id == self.config.in_progress_column && task.started_at.is_none() {
            task.started_at = Some(now);
        }
    }

    /// Write the mutated task if the row still carries `expected`; otherwise
    /// report what actually happened (concurrent mutation or deletion).
    fn commit(&self, task: Task, expected: i64) -> Result<Task> {
        if self.db.update_task(&task, expected)? {
            return Ok(task);
        }
        match self.db.get_task(&task.id)? {
            Some(current) => Err(BoardError::VersionConflict {
                id: task.id,
                expected,
                stored: current.version,
            }),
            None => Err(BoardError::TaskNotFound { id: task.id }),
        }
    }

    fn validate_title(&self, title: &str) -> Result<String> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::validation("title must not be empty"));
        }
        if title.chars().count() > self.config.max_title_length {
            return Err(BoardError::validation(format!(
                "title exceeds {} characters",
                self.config.max_title_length
            )));
        }
        Ok(title.to_string())
    }

    /// Reject a parent assignment whose ancestor chain reaches the task
    /// itself. The walk tracks visited ids so a pre-existing corrupt chain
    /// cannot loop forever.
    fn validate_parent(&self, task_id: &str, parent_id: &str) -> Result<()> {
        if self.db.get_task(parent_id)?.is_none() {
            return Err(BoardError::TaskNotFound {
                id: parent_id.to_string(),
            });
        }
        let mut visited = HashSet::new();
        let mut current = Some(parent_id.to_string());
        while let Some(ancestor) = current {
            if ancestor == task_id {
                return Err(BoardError::validation(
                    "parent chain would create a cycle",
                ));
            }
            if !visited.insert(ancestor.clone()) {
                break;
            }
            current = self.db.get_task(&ancestor)?.and_then(|t| t.parent_id);
        }
        Ok(())
    }
}

fn validate_actor(name: &str) -> Result<String> {
    let name = name.trim();
    if !ACTOR_RE.is_match(name) {
        return Err(BoardError::validation(format!(
            "invalid actor name '{}': must start with a letter and contain only letters, \
             digits, '_' or '-' (max 50 chars)",
            name
        )));
    }
    Ok(name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppContext;

    fn setup() -> AppContext {
        setup_with(BoardConfig::default())
    }

    fn setup_with(config: BoardConfig) -> AppContext {
        let ctx = AppContext::in_memory(config).unwrap();
        ctx.boards().initialize("Test").unwrap();
        ctx
    }

    fn wip_config(limit: u32) -> BoardConfig {
        let mut config = BoardConfig::default();
        for col in &mut config.columns {
            if col.id == "in_progress" {
                col.wip_limit = Some(limit);
            }
        }
        config
    }

    fn add(ctx: &AppContext, title: &str) -> Task {
        ctx.tasks()
            .add_task(NewTask {
                title: title.to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_add_task_defaults() {
        let ctx = setup();
        let task = add(&ctx, "  First task  ");
        assert_eq!(task.title, "First task");
        assert_eq!(task.column_id, "todo");
        assert_eq!(task.creator, "user");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.version, 1);
        assert_eq!(task.position, 1);
        assert_eq!(task.id.len(), 26);
    }

    #[test]
    fn test_add_task_positions_append() {
        let ctx = setup();
        assert_eq!(add(&ctx, "A").position, 1);
        assert_eq!(add(&ctx, "B").position, 2);
        assert_eq!(add(&ctx, "C").position, 3);
    }

    #[test]
    fn test_add_task_rejects_empty_title() {
        let ctx = setup();
        let err = ctx
            .tasks()
            .add_task(NewTask {
                title: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_add_task_rejects_overlong_title() {
        let ctx = setup();
        let err = ctx
            .tasks()
            .add_task(NewTask {
                title: "x".repeat(201),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn test_add_task_rejects_unknown_column() {
        let ctx = setup();
        let err = ctx
            .tasks()
            .add_task(NewTask {
                title: "T".to_string(),
                column_id: Some("shipping".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_add_task_case_folds_creator() {
        let ctx = setup();
        let task = ctx
            .tasks()
            .add_task(NewTask {
                title: "T".to_string(),
                creator: Some("Claude-Agent".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(task.creator, "claude-agent");
    }

    #[test]
    fn test_add_task_rejects_bad_actor() {
        let ctx = setup();
        let too_long = "x".repeat(51);
        for bad in ["", "9lives", "has space", too_long.as_str()] {
            let err = ctx
                .tasks()
                .add_task(NewTask {
                    title: "T".to_string(),
                    creator: Some(bad.to_string()),
                    ..Default::default()
                })
                .unwrap_err();
            assert!(matches!(err, BoardError::Validation(_)), "actor: {bad:?}");
        }
    }

    #[test]
    fn test_move_increments_version_and_appends() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let moved = ctx.tasks().move_task(&task.id, "in_progress", false).unwrap();
        assert_eq!(moved.version, 2);
        assert_eq!(moved.column_id, "in_progress");
        assert_eq!(moved.position, 1);
    }

    #[test]
    fn test_move_to_unknown_column_is_not_found() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let err = ctx.tasks().move_task(&task.id, "shipping", false).unwrap_err();
        assert!(matches!(err, BoardError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_move_missing_task_is_not_found() {
        let ctx = setup();
        let err = ctx.tasks().move_task("nope", "todo", false).unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound { .. }));
    }

    #[test]
    fn test_wip_limit_enforced_and_forceable() {
        let ctx = setup_with(wip_config(3));
        for i in 0..3 {
            let t = add(&ctx, &format!("T{}", i));
            ctx.tasks().move_task(&t.id, "in_progress", false).unwrap();
        }
        let fourth = add(&ctx, "T4");

        let err = ctx
            .tasks()
            .move_task(&fourth.id, "in_progress", false)
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
        assert!(err.to_string().contains("3"));

        let moved = ctx.tasks().move_task(&fourth.id, "in_progress", true).unwrap();
        assert_eq!(moved.column_id, "in_progress");
        assert_eq!(ctx.db.live_count("in_progress").unwrap(), 4);
    }

    #[test]
    fn test_terminal_move_stamps_completed_once() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let done = ctx.tasks().move_task(&task.id, "done", false).unwrap();
        let completed_at = done.completed_at.expect("completed_at set");

        // Re-opening and finishing again keeps the first stamp.
        ctx.tasks().move_task(&task.id, "todo", false).unwrap();
        let reopened = ctx.tasks().get_task(&task.id).unwrap().unwrap();
        assert_eq!(reopened.completed_at, Some(completed_at));
        let done_again = ctx.tasks().move_task(&task.id, "done", false).unwrap();
        assert_eq!(done_again.completed_at, Some(completed_at));
    }

    #[test]
    fn test_started_at_stamped_on_first_entry_only() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let started = ctx.tasks().move_task(&task.id, "in_progress", false).unwrap();
        let started_at = started.started_at.expect("started_at set");

        ctx.tasks().move_task(&task.id, "review", false).unwrap();
        let back = ctx.tasks().move_task(&task.id, "in_progress", false).unwrap();
        assert_eq!(back.started_at, Some(started_at));
    }

    #[test]
    fn test_update_version_gate() {
        let ctx = setup();
        let task = add(&ctx, "T");

        let updated = ctx
            .tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    title: Some("T2".to_string()),
                    ..Default::default()
                },
                Some(1),
            )
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.title, "T2");

        // Second update still using expected_version=1 must conflict and
        // leave the task unchanged.
        let err = ctx
            .tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    title: Some("T3".to_string()),
                    ..Default::default()
                },
                Some(1),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::VersionConflict {
                expected: 1,
                stored: 2,
                ..
            }
        ));
        let stored = ctx.tasks().get_task(&task.id).unwrap().unwrap();
        assert_eq!(stored.title, "T2");
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_update_without_expected_version_applies() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let updated = ctx
            .tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    assignee: Some("Dev-1".to_string()),
                    labels: Some(vec!["bug".to_string()]),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert_eq!(updated.assignee.as_deref(), Some("dev-1"));
        assert_eq!(updated.labels, vec!["bug".to_string()]);
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_update_empty_is_rejected() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let err = ctx
            .tasks()
            .update_task(&task.id, TaskUpdate::default(), None)
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
        assert_eq!(ctx.tasks().get_task(&task.id).unwrap().unwrap().version, 1);
    }

    #[test]
    fn test_update_blocked_reason_set_and_clear() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let blocked = ctx
            .tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    blocked_reason: Some("waiting on CI".to_string()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert!(blocked.blocked_reason.is_some());

        let cleared = ctx
            .tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    clear_blocked_reason: true,
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        assert!(cleared.blocked_reason.is_none());
        assert_eq!(cleared.version, 3);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let ctx = setup();
        let a = add(&ctx, "A");
        let b = add(&ctx, "B");

        ctx.tasks()
            .update_task(
                &b.id,
                TaskUpdate {
                    parent_id: Some(a.id.clone()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        // A → B would close the loop A → B → A.
        let err = ctx
            .tasks()
            .update_task(
                &a.id,
                TaskUpdate {
                    parent_id: Some(b.id.clone()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));

        // Self-parent is the degenerate cycle.
        let err = ctx
            .tasks()
            .update_task(
                &a.id,
                TaskUpdate {
                    parent_id: Some(a.id.clone()),
                    ..Default::default()
                },
                None,
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_archive_requires_criteria() {
        let ctx = setup();
        let err = ctx.tasks().archive_tasks(&ArchiveCriteria::default()).unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_archive_and_restore_roundtrip() {
        let ctx = setup();
        let task = add(&ctx, "T");
        ctx.tasks()
            .update_task(
                &task.id,
                TaskUpdate {
                    labels: Some(vec!["keep".to_string()]),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let affected = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec![task.id.clone()]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(affected, vec![task.id.clone()]);

        let restored = ctx.tasks().restore_task(&task.id, None).unwrap();
        assert!(!restored.archived);
        assert!(restored.archived_at.is_none());
        assert!(restored.version > 2);
        assert_eq!(restored.labels, vec!["keep".to_string()]);
        assert_eq!(restored.title, "T");
        assert_eq!(restored.column_id, "todo");
    }

    #[test]
    fn test_archive_criteria_combine_with_and() {
        let ctx = setup();
        let a = add(&ctx, "A");
        let b = add(&ctx, "B");
        ctx.tasks().move_task(&b.id, "done", false).unwrap();

        // Column criterion alone matches only the done task.
        let affected = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                column_id: Some("done".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(affected, vec![b.id.clone()]);

        // ids AND column: A is in todo, so nothing matches.
        let affected = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec![a.id.clone()]),
                column_id: Some("done".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(affected.is_empty());
    }

    #[test]
    fn test_archive_older_than_uses_update_stamp() {
        let ctx = setup();
        let task = add(&ctx, "T");

        let future = Utc::now() + chrono::Duration::hours(1);
        let affected = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                older_than: Some(future),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(affected, vec![task.id.clone()]);

        ctx.tasks().restore_task(&task.id, None).unwrap();
        let past = Utc::now() - chrono::Duration::hours(1);
        let affected = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                older_than: Some(past),
                ..Default::default()
            })
            .unwrap();
        assert!(affected.is_empty());
    }

    #[test]
    fn test_archive_unknown_id_is_not_found() {
        let ctx = setup();
        let err = ctx
            .tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec!["nope".to_string()]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound { .. }));
    }

    #[test]
    fn test_restore_not_archived_is_validation() {
        let ctx = setup();
        let task = add(&ctx, "T");
        let err = ctx.tasks().restore_task(&task.id, None).unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_restore_into_unknown_column() {
        let ctx = setup();
        let task = add(&ctx, "T");
        ctx.tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec![task.id.clone()]),
                ..Default::default()
            })
            .unwrap();
        let err = ctx
            .tasks()
            .restore_task(&task.id, Some("shipping"))
            .unwrap_err();
        assert!(matches!(err, BoardError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_move_archived_task_rejected() {
        let ctx = setup();
        let task = add(&ctx, "T");
        ctx.tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec![task.id.clone()]),
                ..Default::default()
            })
            .unwrap();
        let err = ctx.tasks().move_task(&task.id, "done", false).unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    #[test]
    fn test_list_filters() {
        let ctx = setup();
        let a = add(&ctx, "A");
        let b = add(&ctx, "B");
        ctx.tasks().move_task(&b.id, "in_progress", false).unwrap();
        ctx.tasks()
            .update_task(
                &a.id,
                TaskUpdate {
                    blocked_reason: Some("blocked".to_string()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();

        let in_progress = ctx
            .tasks()
            .list_tasks(&TaskFilter {
                column_id: Some("in_progress".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, b.id);

        let blocked = ctx
            .tasks()
            .list_tasks(&TaskFilter {
                blocked_only: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].id, a.id);
    }

    #[test]
    fn test_delete_task() {
        let ctx = setup();
        let task = add(&ctx, "T");
        ctx.tasks().delete_task(&task.id).unwrap();
        assert!(ctx.tasks().get_task(&task.id).unwrap().is_none());
        let err = ctx.tasks().delete_task(&task.id).unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound { .. }));
    }

    #[test]
    fn test_reset_board_removes_everything() {
        let ctx = setup();
        add(&ctx, "A");
        let b = add(&ctx, "B");
        ctx.tasks()
            .archive_tasks(&ArchiveCriteria {
                task_ids: Some(vec![b.id]),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(ctx.tasks().reset_board().unwrap(), 2);
        assert!(ctx.tasks().list_tasks(&TaskFilter {
            include_archived: true,
            ..Default::default()
        })
        .unwrap()
        .is_empty());
    }

    #[test]
    fn test_actionable_excludes_blocked_dependent_and_done() {
        let ctx = setup();
        let open = add(&ctx, "Open");
        let blocker = add(&ctx, "Blocker");
        let blocked = ctx
            .tasks()
            .add_task(NewTask {
                title: "Dependent".to_string(),
                depends_on: vec![blocker.id.clone()],
                ..Default::default()
            })
            .unwrap();
        let reasoned = add(&ctx, "Reasoned");
        ctx.tasks()
            .update_task(
                &reasoned.id,
                TaskUpdate {
                    blocked_reason: Some("waiting".to_string()),
                    ..Default::default()
                },
                None,
            )
            .unwrap();
        let finished = add(&ctx, "Finished");
        ctx.tasks().move_task(&finished.id, "done", false).unwrap();

        let actionable = ctx.tasks().actionable_tasks().unwrap();
        let ids: Vec<&str> = actionable.iter().map(|t| t.id.as_str()).collect();
        assert!(ids.contains(&open.id.as_str()));
        assert!(ids.contains(&blocker.id.as_str()));
        assert!(!ids.contains(&blocked.id.as_str()));
        assert!(!ids.contains(&reasoned.id.as_str()));
        assert!(!ids.contains(&finished.id.as_str()));

        // Completing the blocker frees the dependent task.
        ctx.tasks().move_task(&blocker.id, "done", false).unwrap();
        let actionable = ctx.tasks().actionable_tasks().unwrap();
        assert!(actionable.iter().any(|t| t.id == blocked.id));
    }
}
