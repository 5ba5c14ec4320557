//! Link graph: directed, typed edges between tasks.
//!
//! `blocks` and `blocked_by` are maintained as a single logical
//! bidirectional relationship: inserting either stores its forced inverse in
//! the same transaction, and removing one removes both directions.
//! `related` edges stand alone.

use chrono::Utc;

use crate::db::BoardDb;
use crate::errors::{BoardError, Result};
use crate::models::{LinkType, TaskLink};

pub struct LinkService<'a> {
    db: &'a BoardDb,
}

impl<'a> LinkService<'a> {
    pub fn new(db: &'a BoardDb) -> Self {
        Self { db }
    }

    /// Insert an edge (idempotently) together with its forced inverse.
    pub fn add_link(&self, from_id: &str, to_id: &str, link_type: LinkType) -> Result<()> {
        if from_id == to_id {
            return Err(BoardError::validation("a task cannot link to itself"));
        }
        self.require_task(from_id)?;
        self.require_task(to_id)?;

        let now = Utc::now();
        let mut links = vec![TaskLink {
            from_task_id: from_id.to_string(),
            to_task_id: to_id.to_string(),
            link_type,
            created_at: now,
        }];
        if let Some(inverse) = link_type.inverse() {
            links.push(TaskLink {
                from_task_id: to_id.to_string(),
                to_task_id: from_id.to_string(),
                link_type: inverse,
                created_at: now,
            });
        }
        self.db.insert_links(&links)?;
        tracing::debug!(from = %from_id, to = %to_id, kind = %link_type, "link added");
        Ok(())
    }

    /// Remove an edge and, when it has one, its forced inverse.
    pub fn remove_link(&self, from_id: &str, to_id: &str, link_type: LinkType) -> Result<()> {
        let mut edges = vec![(from_id.to_string(), to_id.to_string(), link_type)];
        if let Some(inverse) = link_type.inverse() {
            edges.push((to_id.to_string(), from_id.to_string(), inverse));
        }
        self.db.delete_links(&edges)?;
        Ok(())
    }

    pub fn get_links_from(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        self.db.links_from(task_id, link_type)
    }

    pub fn get_links_to(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        self.db.links_to(task_id, link_type)
    }

    pub fn get_all_links(&self, task_id: &str, link_type: Option<LinkType>) -> Result<Vec<TaskLink>> {
        self.db.links_for(task_id, link_type)
    }

    /// Ids of tasks currently blocking `task_id`.
    pub fn get_blockers(&self, task_id: &str) -> Result<Vec<String>> {
        Ok(self
            .db
            .links_from(task_id, Some(LinkType::BlockedBy))?
            .into_iter()
            .map(|l| l.to_task_id)
            .collect())
    }

    /// Ids of tasks `task_id` currently blocks.
    pub fn get_blocking(&self, task_id: &str) -> Result<Vec<String>> {
        Ok(self
            .db
            .links_from(task_id, Some(LinkType::Blocks))?
            .into_iter()
            .map(|l| l.to_task_id)
            .collect())
    }

    fn require_task(&self, id: &str) -> Result<()> {
        if self.db.get_task(id)?.is_none() {
            return Err(BoardError::TaskNotFound { id: id.to_string() });
        }
        Ok(())
    }
}
