//! Typed error hierarchy for the board core.
//!
//! Every core operation fails with a `BoardError`; the variants map onto a
//! small integer code (`NOT_FOUND`, `VALIDATION`, `CONFLICT`, `GENERAL_ERROR`)
//! that callers translate into exit codes or protocol errors. No operation
//! leaves a partial mutation behind when it returns an error.

use thiserror::Error;

/// Integer code for lookups that referenced a missing task or column.
pub const NOT_FOUND: i32 = 2;
/// Integer code for malformed input, WIP-limit rejections, and missing criteria.
pub const VALIDATION: i32 = 3;
/// Integer code for optimistic-version mismatches.
pub const CONFLICT: i32 = 4;
/// Integer code for everything else, storage failures included.
pub const GENERAL_ERROR: i32 = 1;

/// Errors surfaced by the board core.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Task {id} not found")]
    TaskNotFound { id: String },

    #[error("Column '{id}' not found")]
    ColumnNotFound { id: String },

    #[error("Board not initialized (run 'taskdeck init' first)")]
    BoardNotInitialized,

    #[error("Board already initialized")]
    BoardExists,

    #[error("{0}")]
    Validation(String),

    #[error("Version conflict on task {id}: expected {expected}, stored {stored}")]
    VersionConflict {
        id: String,
        expected: i64,
        stored: i64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid stored data: {0}")]
    Data(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    /// The small integer code for this error, used by callers as an exit code.
    pub fn code(&self) -> i32 {
        match self {
            Self::TaskNotFound { .. } | Self::ColumnNotFound { .. } | Self::BoardNotInitialized => {
                NOT_FOUND
            }
            Self::Validation(_) | Self::BoardExists => VALIDATION,
            Self::VersionConflict { .. } => CONFLICT,
            Self::Storage(_) | Self::Data(_) | Self::Other(_) => GENERAL_ERROR,
        }
    }

    /// Shorthand for a validation failure with a human-readable reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_not_found_carries_id() {
        let err = BoardError::TaskNotFound {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
        };
        assert!(err.to_string().contains("01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert_eq!(err.code(), NOT_FOUND);
    }

    #[test]
    fn version_conflict_carries_both_versions() {
        let err = BoardError::VersionConflict {
            id: "t1".to_string(),
            expected: 1,
            stored: 2,
        };
        match &err {
            BoardError::VersionConflict {
                expected, stored, ..
            } => {
                assert_eq!(*expected, 1);
                assert_eq!(*stored, 2);
            }
            _ => panic!("Expected VersionConflict"),
        }
        assert_eq!(err.code(), CONFLICT);
    }

    #[test]
    fn validation_uses_validation_code() {
        let err = BoardError::validation("title must not be empty");
        assert_eq!(err.code(), VALIDATION);
        assert_eq!(err.to_string(), "title must not be empty");
    }

    #[test]
    fn wip_style_validation_names_the_limit() {
        let err = BoardError::validation("column 'in_progress' is at its WIP limit (3)");
        assert!(err.to_string().contains("3"));
        assert_eq!(err.code(), VALIDATION);
    }

    #[test]
    fn storage_errors_use_general_code() {
        let err: BoardError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.code(), GENERAL_ERROR);
    }

    #[test]
    fn all_variants_implement_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&BoardError::BoardNotInitialized);
        assert_std_error(&BoardError::validation("x"));
    }
}
