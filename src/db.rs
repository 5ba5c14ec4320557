//! SQLite storage adapter for the board.
//!
//! `BoardDb` is the single storage implementation behind the core services:
//! transactional row CRUD over the board/columns/tasks/links relations, a
//! text-search query over archived tasks, and a lock-free change counter for
//! polling consumers. Invariants (WIP limits, version gating, stamping) live
//! in the services, not here.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{BoardError, Result};
use crate::models::{Board, Column, LinkType, Task, TaskLink};

const TASK_COLUMNS: &str = "id, title, description, column_id, position, priority, creator, \
     assignee, parent_id, depends_on, files, labels, blocked_reason, external_id, due_at, \
     version, created_at, updated_at, started_at, completed_at, archived, archived_at";

/// Orders tasks by (column position, position within column).
const TASK_ORDER: &str =
    "ORDER BY (SELECT position FROM columns WHERE columns.id = tasks.column_id), position";

pub struct BoardDb {
    conn: Connection,
}

impl BoardDb {
    /// Open (or create) the board database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory board database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS board (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS columns (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                position INTEGER NOT NULL,
                wip_limit INTEGER,
                terminal INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                column_id TEXT NOT NULL REFERENCES columns(id),
                position INTEGER NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',
                creator TEXT NOT NULL,
                assignee TEXT,
                parent_id TEXT,
                depends_on TEXT NOT NULL DEFAULT '[]',
                files TEXT NOT NULL DEFAULT '[]',
                labels TEXT NOT NULL DEFAULT '[]',
                blocked_reason TEXT,
                external_id TEXT,
                due_at TEXT,
                version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                started_at TEXT,
                completed_at TEXT,
                archived INTEGER NOT NULL DEFAULT 0,
                archived_at TEXT
            );

            CREATE TABLE IF NOT EXISTS task_links (
                from_task_id TEXT NOT NULL,
                to_task_id TEXT NOT NULL,
                link_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (from_task_id, to_task_id, link_type)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(column_id, position);
            CREATE INDEX IF NOT EXISTS idx_tasks_archived ON tasks(archived);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_external
                ON tasks(external_id) WHERE external_id IS NOT NULL;
            CREATE INDEX IF NOT EXISTS idx_links_to ON task_links(to_task_id);
            ",
        )?;
        Ok(())
    }

    /// Monotonically increasing change counter, readable without locking.
    ///
    /// Backed by SQLite's `data_version` pragma: it is bumped by commits from
    /// other connections, which is the signal polling consumers (TUI, web)
    /// watch for between their own reads.
    pub fn change_counter(&self) -> Result<i64> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "data_version", |row| row.get(0))?;
        Ok(version)
    }

    // ── Board ─────────────────────────────────────────────────────────

    pub fn insert_board(&self, board: &Board) -> Result<()> {
        self.conn.execute(
            "INSERT INTO board (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![board.id, board.name, board.created_at, board.updated_at],
        )?;
        Ok(())
    }

    pub fn get_board(&self) -> Result<Option<Board>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at, updated_at FROM board LIMIT 1",
                [],
                |row| {
                    Ok(Board {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(BoardError::from)
    }

    // ── Columns ───────────────────────────────────────────────────────

    pub fn insert_column(&self, column: &Column) -> Result<()> {
        self.conn.execute(
            "INSERT INTO columns (id, name, position, wip_limit, terminal)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                column.id,
                column.name,
                column.position,
                column.wip_limit,
                column.terminal
            ],
        )?;
        Ok(())
    }

    pub fn get_column(&self, id: &str) -> Result<Option<Column>> {
        self.conn
            .query_row(
                "SELECT id, name, position, wip_limit, terminal FROM columns WHERE id = ?1",
                params![id],
                column_from_row,
            )
            .optional()
            .map_err(BoardError::from)
    }

    pub fn list_columns(&self) -> Result<Vec<Column>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, position, wip_limit, terminal FROM columns ORDER BY position",
        )?;
        let rows = stmt.query_map([], column_from_row)?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    // ── Task CRUD ─────────────────────────────────────────────────────

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, description, column_id, position, priority, creator,
             assignee, parent_id, depends_on, files, labels, blocked_reason, external_id, due_at,
             version, created_at, updated_at, started_at, completed_at, archived, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                task.id,
                task.title,
                task.description,
                task.column_id,
                task.position,
                task.priority.as_str(),
                task.creator,
                task.assignee,
                task.parent_id,
                serde_json::to_string(&task.depends_on)?,
                serde_json::to_string(&task.files)?,
                serde_json::to_string(&task.labels)?,
                task.blocked_reason,
                task.external_id,
                task.due_at,
                task.version,
                task.created_at,
                task.updated_at,
                task.started_at,
                task.completed_at,
                task.archived,
                task.archived_at
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![id],
                task_row,
            )
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    pub fn get_task_by_external_id(&self, external_id: &str) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE external_id = ?1", TASK_COLUMNS),
                params![external_id],
                task_row,
            )
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    /// First non-archived task with this exact title, in board order.
    ///
    /// Tasks with duplicate titles are indistinguishable here; the first row
    /// in (column, position) order wins.
    pub fn get_task_by_title(&self, title: &str) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM tasks WHERE archived = 0 AND title = ?1 {} LIMIT 1",
                    TASK_COLUMNS, TASK_ORDER
                ),
                params![title],
                task_row,
            )
            .optional()?;
        row.map(TaskRow::into_task).transpose()
    }

    /// All tasks in (column position, task position) order. Archived rows are
    /// included only when asked for.
    pub fn list_tasks(&self, include_archived: bool) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE (archived = 0 OR ?1) {}",
            TASK_COLUMNS, TASK_ORDER
        ))?;
        let rows = stmt.query_map(params![include_archived], task_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }

    /// Next append position in a column: max existing position + 1.
    /// Positions are never renumbered on delete.
    pub fn next_position(&self, column_id: &str) -> Result<i64> {
        let max: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) FROM tasks WHERE column_id = ?1",
            params![column_id],
            |row| row.get(0),
        )?;
        Ok(max + 1)
    }

    /// Count of live (non-archived) tasks in a column, for WIP checks.
    pub fn live_count(&self, column_id: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE column_id = ?1 AND archived = 0",
            params![column_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Full-row update guarded by the stored version.
    ///
    /// The write applies only if the row still carries `expected_version`;
    /// returns false when it does not (row gone or concurrently mutated), so
    /// a racing writer surfaces as a conflict rather than a lost update.
    pub fn update_task(&self, task: &Task, expected_version: i64) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, column_id = ?3, position = ?4,
             priority = ?5, creator = ?6, assignee = ?7, parent_id = ?8, depends_on = ?9,
             files = ?10, labels = ?11, blocked_reason = ?12, external_id = ?13, due_at = ?14,
             version = ?15, updated_at = ?16, started_at = ?17, completed_at = ?18,
             archived = ?19, archived_at = ?20
             WHERE id = ?21 AND version = ?22",
            params![
                task.title,
                task.description,
                task.column_id,
                task.position,
                task.priority.as_str(),
                task.creator,
                task.assignee,
                task.parent_id,
                serde_json::to_string(&task.depends_on)?,
                serde_json::to_string(&task.files)?,
                serde_json::to_string(&task.labels)?,
                task.blocked_reason,
                task.external_id,
                task.due_at,
                task.version,
                task.updated_at,
                task.started_at,
                task.completed_at,
                task.archived,
                task.archived_at,
                task.id,
                expected_version
            ],
        )?;
        Ok(n > 0)
    }

    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Flip the archive flag on a set of tasks in one transaction.
    ///
    /// Already-archived rows are skipped. Returns the ids actually affected.
    pub fn archive_tasks(&self, ids: &[String], now: DateTime<Utc>) -> Result<Vec<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = Vec::new();
        for id in ids {
            let n = tx.execute(
                "UPDATE tasks SET archived = 1, archived_at = ?1, updated_at = ?1,
                 version = version + 1
                 WHERE id = ?2 AND archived = 0",
                params![now, id],
            )?;
            if n > 0 {
                affected.push(id.clone());
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    /// Case-insensitive text search over archived tasks' title/description.
    ///
    /// An empty query matches all archived rows. Returns one page plus the
    /// total match count for pagination.
    pub fn search_archived(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Task>, i64)> {
        let query = query.trim();
        let (where_clause, needle) = if query.is_empty() {
            ("archived = 1".to_string(), None)
        } else {
            (
                "archived = 1 AND (LOWER(title) LIKE '%' || LOWER(?1) || '%' \
                 OR LOWER(COALESCE(description, '')) LIKE '%' || LOWER(?1) || '%')"
                    .to_string(),
                Some(query.to_string()),
            )
        };

        let total: i64 = match &needle {
            Some(q) => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks WHERE {}", where_clause),
                params![q],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM tasks WHERE {}", where_clause),
                [],
                |row| row.get(0),
            )?,
        };

        let sql = format!(
            "SELECT {} FROM tasks WHERE {} ORDER BY archived_at DESC, id LIMIT {} OFFSET {}",
            TASK_COLUMNS, where_clause, limit, offset
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut tasks = Vec::new();
        match &needle {
            Some(q) => {
                let rows = stmt.query_map(params![q], task_row)?;
                for row in rows {
                    tasks.push(row?.into_task()?);
                }
            }
            None => {
                let rows = stmt.query_map([], task_row)?;
                for row in rows {
                    tasks.push(row?.into_task()?);
                }
            }
        }
        Ok((tasks, total))
    }

    /// Hard-delete archived rows, optionally only those archived before the
    /// given cutoff. Returns the number of rows removed.
    pub fn purge_archived(&self, older_than: Option<DateTime<Utc>>) -> Result<usize> {
        let n = match older_than {
            Some(cutoff) => self.conn.execute(
                "DELETE FROM tasks WHERE archived = 1 AND archived_at < ?1",
                params![cutoff],
            )?,
            None => self.conn.execute("DELETE FROM tasks WHERE archived = 1", [])?,
        };
        Ok(n)
    }

    /// Hard-delete every task and every link, in one transaction.
    pub fn delete_all_tasks(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM task_links", [])?;
        let n = tx.execute("DELETE FROM tasks", [])?;
        tx.commit()?;
        Ok(n)
    }

    // ── Links ─────────────────────────────────────────────────────────

    /// Insert a set of edges in one transaction, each idempotently: a
    /// duplicate triple is a no-op, not an error.
    /// Returns the number of edges actually stored.
    pub fn insert_links(&self, links: &[TaskLink]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut stored = 0;
        for link in links {
            stored += tx.execute(
                "INSERT OR IGNORE INTO task_links (from_task_id, to_task_id, link_type, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    link.from_task_id,
                    link.to_task_id,
                    link.link_type.as_str(),
                    link.created_at
                ],
            )?;
        }
        tx.commit()?;
        Ok(stored)
    }

    /// Delete a set of edges in one transaction. Returns the number removed.
    pub fn delete_links(&self, edges: &[(String, String, LinkType)]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut removed = 0;
        for (from, to, link_type) in edges {
            removed += tx.execute(
                "DELETE FROM task_links
                 WHERE from_task_id = ?1 AND to_task_id = ?2 AND link_type = ?3",
                params![from, to, link_type.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    pub fn links_from(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        match link_type {
            Some(t) => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE from_task_id = ?1 AND link_type = ?2 ORDER BY created_at, to_task_id",
                params![task_id, t.as_str()],
            ),
            None => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE from_task_id = ?1 ORDER BY created_at, to_task_id",
                params![task_id],
            ),
        }
    }

    pub fn links_to(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        match link_type {
            Some(t) => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE to_task_id = ?1 AND link_type = ?2 ORDER BY created_at, from_task_id",
                params![task_id, t.as_str()],
            ),
            None => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE to_task_id = ?1 ORDER BY created_at, from_task_id",
                params![task_id],
            ),
        }
    }

    pub fn links_for(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        match link_type {
            Some(t) => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE (from_task_id = ?1 OR to_task_id = ?1) AND link_type = ?2
                 ORDER BY created_at, from_task_id, to_task_id",
                params![task_id, t.as_str()],
            ),
            None => self.query_links(
                "SELECT from_task_id, to_task_id, link_type, created_at FROM task_links
                 WHERE from_task_id = ?1 OR to_task_id = ?1
                 ORDER BY created_at, from_task_id, to_task_id",
                params![task_id],
            ),
        }
    }

    fn query_links<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<TaskLink>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(LinkRow {
                from_task_id: row.get(0)?,
                to_task_id: row.get(1)?,
                link_type: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;
        let mut links = Vec::new();
        for row in rows {
            links.push(row?.into_link()?);
        }
        Ok(links)
    }
}

fn column_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        name: row.get(1)?,
        position: row.get(2)?,
        wip_limit: row.get(3)?,
        terminal: row.get(4)?,
    })
}

/// Raw task row; JSON list columns and the priority string are parsed by
/// `into_task`.
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    column_id: String,
    position: i64,
    priority: String,
    creator: String,
    assignee: Option<String>,
    parent_id: Option<String>,
    depends_on: String,
    files: String,
    labels: String,
    blocked_reason: Option<String>,
    external_id: Option<String>,
    due_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    archived: bool,
    archived_at: Option<DateTime<Utc>>,
}

fn task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        column_id: row.get(3)?,
        position: row.get(4)?,
        priority: row.get(5)?,
        creator: row.get(6)?,
        assignee: row.get(7)?,
        parent_id: row.get(8)?,
        depends_on: row.get(9)?,
        files: row.get(10)?,
        labels: row.get(11)?,
        blocked_reason: row.get(12)?,
        external_id: row.get(13)?,
        due_at: row.get(14)?,
        version: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
        started_at: row.get(18)?,
        completed_at: row.get(19)?,
        archived: row.get(20)?,
        archived_at: row.get(21)?,
    })
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let priority = self
            .priority
            .parse()
            .map_err(|e: String| BoardError::Other(anyhow::anyhow!(e)))?;
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            column_id: self.column_id,
            position: self.position,
            priority,
            creator: self.creator,
            assignee: self.assignee,
            parent_id: self.parent_id,
            depends_on: serde_json::from_str(&self.depends_on)?,
            files: serde_json::from_str(&self.files)?,
            labels: serde_json::from_str(&self.labels)?,
            blocked_reason: self.blocked_reason,
            external_id: self.external_id,
            due_at: self.due_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            archived: self.archived,
            archived_at: self.archived_at,
        })
    }
}

struct LinkRow {
    from_task_id: String,
    to_task_id: String,
    link_type: String,
    created_at: DateTime<Utc>,
}

impl LinkRow {
    fn into_link(self) -> Result<TaskLink> {
        let link_type = self
            .link_type
            .parse()
            .map_err(|e: String| BoardError::Other(anyhow::anyhow!(e)))?;
        Ok(TaskLink {
            from_task_id: self.from_task_id,
            to_task_id: self.to_task_id,
            link_type,
            created_at: self.created_at,
        })
    }
}
