//! Conflict resolver: decides which side wins for a task present both on
//! the board and in the external todo list.

use crate::config::ConflictStrategy;
use crate::models::TodoStatus;

/// The side whose state prevails for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    /// The external todo item; its mapped column becomes the target.
    Todo,
    /// The board; no column change is proposed.
    Board,
}

/// Numeric priority of a status for the `status_priority` strategy.
pub fn status_rank(status: TodoStatus) -> u8 {
    match status {
        TodoStatus::Cancelled => 0,
        TodoStatus::Pending => 1,
        TodoStatus::InProgress => 2,
        TodoStatus::Completed => 3,
    }
}

/// Resolve one matched item against the board task's equivalent status.
///
/// Under `status_priority`, two terminal-state overrides short-circuit the
/// rank comparison: an external `completed` always wins, and a board task
/// already terminal always stays terminal. Together they guarantee a
/// completion signal is never lost and a terminal task is never reopened by
/// a lower-priority external state. An exact rank tie goes to the external
/// item, treated as the more recent source of truth.
pub fn resolve(
    strategy: ConflictStrategy,
    todo_status: TodoStatus,
    board_status: TodoStatus,
) -> Winner {
    match strategy {
        ConflictStrategy::TodowriteWins => Winner::Todo,
        ConflictStrategy::KanbanWins => Winner::Board,
        ConflictStrategy::StatusPriority => {
            if todo_status == TodoStatus::Completed {
                return Winner::Todo;
            }
            if board_status == TodoStatus::Completed {
                return Winner::Board;
            }
            if status_rank(todo_status) >= status_rank(board_status) {
                Winner::Todo
            } else {
                Winner::Board
            }
        }
    }
}
