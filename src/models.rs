use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The board row. One board per store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named stage a task can occupy.
///
/// `wip_limit` caps the number of simultaneously non-archived tasks;
/// `terminal` marks the column whose occupancy means "done".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub wip_limit: Option<u32>,
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed, typed edge kind between two tasks.
///
/// `blocks` and `blocked_by` are forced inverses of one another: every
/// `blocks` edge A→B is stored together with `blocked_by` B→A. `related`
/// has no forced inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Blocks,
    BlockedBy,
    Related,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::BlockedBy => "blocked_by",
            Self::Related => "related",
        }
    }

    /// The forced inverse edge type, if this type has one.
    pub fn inverse(&self) -> Option<LinkType> {
        match self {
            Self::Blocks => Some(Self::BlockedBy),
            Self::BlockedBy => Some(Self::Blocks),
            Self::Related => None,
        }
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocks" => Ok(Self::Blocks),
            "blocked_by" => Ok(Self::BlockedBy),
            "related" => Ok(Self::Related),
            _ => Err(format!("Invalid link type: {}", s)),
        }
    }
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A work item on the board.
///
/// `version` increases by exactly 1 on every successful mutation and is the
/// optimistic-concurrency gate between actors sharing the store. `position`
/// is monotonically assigned within a column and never renumbered on delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// ULID: 26 characters, lexicographically sortable by creation time.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub column_id: String,
    pub position: i64,
    pub priority: Priority,
    pub creator: String,
    pub assignee: Option<String>,
    pub parent_id: Option<String>,
    pub depends_on: Vec<String>,
    pub files: Vec<String>,
    pub labels: Vec<String>,
    pub blocked_reason: Option<String>,
    /// External todo-list id this task is bound to, if the sync engine has
    /// seen it. Unique across tasks.
    pub external_id: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Task {
    /// True when the task has no blocked-reason and no unresolved
    /// dependencies, i.e. it is eligible for ranking.
    pub fn is_actionable(&self, is_resolved: impl Fn(&str) -> bool) -> bool {
        self.blocked_reason.is_none() && self.depends_on.iter().all(|dep| is_resolved(dep))
    }
}

/// Directed typed edge between two tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLink {
    pub from_task_id: String,
    pub to_task_id: String,
    pub link_type: LinkType,
    pub created_at: DateTime<Utc>,
}

/// Filter for task listings. Archived tasks are excluded unless requested.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub column_id: Option<String>,
    pub creator: Option<String>,
    pub assignee: Option<String>,
    pub blocked_only: bool,
    pub include_archived: bool,
}

/// One scorer's contribution to a task's total, kept for explainability.
#[derive(Debug, Clone, Serialize)]
pub struct ScorerContribution {
    pub scorer: String,
    pub score: f64,
}

/// A ranked task with its total score and per-scorer breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub task: Task,
    pub total: f64,
    pub breakdown: Vec<ScorerContribution>,
}

/// Outcome of one sync-engine run over an external todo batch.
///
/// Per-item failures are recorded, not fatal; `success` is false when any
/// item failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub created: usize,
    pub moved: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Status of an item in the external todo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TodoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid todo status: {}", s)),
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
