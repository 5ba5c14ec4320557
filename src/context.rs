//! Per-invocation wiring.
//!
//! One `AppContext` is constructed per CLI/tool invocation and passed to
//! each service; there is no global store handle. Cross-invocation safety
//! comes from the store's row-level writes plus task versioning, not from
//! anything held here.

use std::path::Path;

use crate::board::BoardDirectory;
use crate::config::{BoardConfig, TASKDECK_DIR};
use crate::db::BoardDb;
use crate::errors::{BoardError, Result};
use crate::links::LinkService;
use crate::tasks::TaskService;

/// Database file name inside the `.taskdeck` directory.
pub const DB_FILE: &str = "board.db";

pub struct AppContext {
    pub config: BoardConfig,
    pub db: BoardDb,
}

impl AppContext {
    /// Open the board for a project directory, creating the `.taskdeck`
    /// directory (but not the board row) on first use.
    pub fn open(project_dir: &Path) -> Result<Self> {
        let config = BoardConfig::load(project_dir)?;
        let deck_dir = project_dir.join(TASKDECK_DIR);
        std::fs::create_dir_all(&deck_dir).map_err(|e| {
            BoardError::Other(anyhow::anyhow!(
                "Failed to create {}: {}",
                deck_dir.display(),
                e
            ))
        })?;
        let db = BoardDb::new(&deck_dir.join(DB_FILE))?;
        Ok(Self { config, db })
    }

    /// In-memory context with the given configuration (for testing).
    pub fn in_memory(config: BoardConfig) -> Result<Self> {
        let db = BoardDb::new_in_memory()?;
        Ok(Self { config, db })
    }

    pub fn boards(&self) -> BoardDirectory<'_> {
        BoardDirectory::new(&self.db, &self.config)
    }

    pub fn tasks(&self) -> TaskService<'_> {
        TaskService::new(&self.db, &self.config)
    }

    pub fn links(&self) -> LinkService<'_> {
        LinkService::new(&self.db)
    }
}
