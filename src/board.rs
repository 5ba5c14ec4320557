//! Board directory: board identity and the ordered column set.
//!
//! Read-mostly after initialization. Columns are created once by
//! `initialize` from the configured set; a second initialization against an
//! existing board is a caller error.

use chrono::Utc;
use ulid::Ulid;

use crate::config::BoardConfig;
use crate::db::BoardDb;
use crate::errors::{BoardError, Result};
use crate::models::{Board, Column};

pub struct BoardDirectory<'a> {
    db: &'a BoardDb,
    config: &'a BoardConfig,
}

impl<'a> BoardDirectory<'a> {
    pub fn new(db: &'a BoardDb, config: &'a BoardConfig) -> Self {
        Self { db, config }
    }

    /// Create the board row and one column row per configured column,
    /// preserving configured order as `position`.
    pub fn initialize(&self, name: &str) -> Result<Board> {
        if self.db.get_board()?.is_some() {
            return Err(BoardError::BoardExists);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::validation("board name must not be empty"));
        }

        let now = Utc::now();
        let board = Board {
            id: Ulid::new().to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.insert_board(&board)?;
        for (position, col) in self.config.columns.iter().enumerate() {
            self.db.insert_column(&Column {
                id: col.id.clone(),
                name: col.name.clone(),
                position: position as i64,
                wip_limit: col.wip_limit,
                terminal: col.terminal,
            })?;
        }
        tracing::info!(board = %board.id, columns = self.config.columns.len(), "board initialized");
        Ok(board)
    }

    pub fn board(&self) -> Result<Board> {
        self.db.get_board()?.ok_or(BoardError::BoardNotInitialized)
    }

    pub fn get_column(&self, id: &str) -> Result<Column> {
        self.db
            .get_column(id)?
            .ok_or_else(|| BoardError::ColumnNotFound { id: id.to_string() })
    }

    /// All columns ordered by position.
    pub fn columns(&self) -> Result<Vec<Column>> {
        self.db.list_columns()
    }

    /// The first column flagged terminal, or none.
    pub fn terminal_column(&self) -> Result<Option<Column>> {
        Ok(self.db.list_columns()?.into_iter().find(|c| c.terminal))
    }
}
