//! Board configuration.
//!
//! Values are read from `.taskdeck/config.toml` under the project directory
//! when present; every field has a default so a missing file is not an
//! error. Out-of-range values are rejected at load time.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{BoardError, Result};

/// Directory holding the board database and configuration.
pub const TASKDECK_DIR: &str = ".taskdeck";
/// Configuration file name inside [`TASKDECK_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Rule set deciding which side wins when a task exists both on the board
/// and in the external todo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// External state always wins.
    TodowriteWins,
    /// Compare numeric status priority; terminal states override.
    StatusPriority,
    /// Board state always wins. Wire spelling is `kaban_wins`.
    #[serde(rename = "kaban_wins")]
    KanbanWins,
}

impl ConflictStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TodowriteWins => "todowrite_wins",
            Self::StatusPriority => "status_priority",
            Self::KanbanWins => "kaban_wins",
        }
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "todowrite_wins" => Ok(Self::TodowriteWins),
            "status_priority" => Ok(Self::StatusPriority),
            "kaban_wins" => Ok(Self::KanbanWins),
            _ => Err(format!("Invalid conflict strategy: {}", s)),
        }
    }
}

/// What to do with external items in `cancelled` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledPolicy {
    /// Drop the item entirely.
    Skip,
    /// File the item to the backlog column.
    Backlog,
}

impl CancelledPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Backlog => "backlog",
        }
    }
}

impl FromStr for CancelledPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "backlog" => Ok(Self::Backlog),
            _ => Err(format!("Invalid cancelled policy: {}", s)),
        }
    }
}

/// One column definition used by `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub wip_limit: Option<u32>,
    #[serde(default)]
    pub terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub conflict_strategy: ConflictStrategy,
    pub cancelled_policy: CancelledPolicy,
    /// Maximum task title length; external todo content is truncated to this
    /// before matching. Valid range 50–1000.
    pub max_title_length: usize,
    /// Column new tasks land in when no column is given.
    pub default_column: String,
    /// Actor recorded as creator when no actor is given.
    pub default_actor: String,
    /// Column cancelled items are filed to under the `backlog` policy.
    pub backlog_column: String,
    /// The canonical in-progress column; first entry stamps `started_at`.
    pub in_progress_column: String,
    /// Ordered column set created by `init`.
    pub columns: Vec<ColumnConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            conflict_strategy: ConflictStrategy::StatusPriority,
            cancelled_policy: CancelledPolicy::Skip,
            max_title_length: 200,
            default_column: "todo".to_string(),
            default_actor: "user".to_string(),
            backlog_column: "backlog".to_string(),
            in_progress_column: "in_progress".to_string(),
            columns: vec![
                column("backlog", "Backlog", None, false),
                column("todo", "To Do", None, false),
                column("in_progress", "In Progress", None, false),
                column("review", "Review", None, false),
                column("done", "Done", None, true),
            ],
        }
    }
}

fn column(id: &str, name: &str, wip_limit: Option<u32>, terminal: bool) -> ColumnConfig {
    ColumnConfig {
        id: id.to_string(),
        name: name.to_string(),
        wip_limit,
        terminal,
    }
}

impl BoardConfig {
    /// Load configuration for a project directory, falling back to defaults
    /// when `.taskdeck/config.toml` does not exist.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(TASKDECK_DIR).join(CONFIG_FILE);
        let config = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| {
                BoardError::Other(anyhow::anyhow!(
                    "Failed to read config at {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let config: Self = toml::from_str(&raw)
                .map_err(|e| BoardError::validation(format!("Invalid config file: {}", e)))?;
            tracing::debug!(path = %path.display(), "loaded board config");
            config
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(50..=1000).contains(&self.max_title_length) {
            return Err(BoardError::validation(format!(
                "max_title_length must be between 50 and 1000, got {}",
                self.max_title_length
            )));
        }
        if self.columns.is_empty() {
            return Err(BoardError::validation("at least one column is required"));
        }
        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            if col.id.trim().is_empty() {
                return Err(BoardError::validation("column id must not be empty"));
            }
            if !seen.insert(col.id.as_str()) {
                return Err(BoardError::validation(format!(
                    "duplicate column id '{}'",
                    col.id
                )));
            }
        }
        if self.columns.iter().filter(|c| c.terminal).count() > 1 {
            return Err(BoardError::validation(
                "at most one column may be marked terminal",
            ));
        }
        Ok(())
    }
}
