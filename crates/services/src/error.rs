//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::import::{ImportError, ImportWarning};
use drill_core::model::{CourseError, CourseId, LectureId};
use drill_core::test_flow::TestFlowError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `VocabSessionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VocabSessionError {
    #[error(transparent)]
    Flow(#[from] TestFlowError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the grammar study session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GrammarSessionError {
    #[error("course not found: {0}")]
    CourseNotFound(CourseId),
    #[error("course has no questions")]
    EmptyCourse,
    #[error("no weak questions to review")]
    NoWeakQuestions,
    #[error("no questions are due today")]
    NothingDue,
    #[error("session already finished")]
    Finished,
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("course not found: {0}")]
    NotFound(CourseId),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CourseServiceError {
    /// Line warnings when an import was rejected as a whole.
    #[must_use]
    pub fn import_warnings(&self) -> Option<&[ImportWarning]> {
        match self {
            CourseServiceError::Import(err) => Some(err.warnings()),
            _ => None,
        }
    }
}

/// Errors emitted by `UnitService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnitServiceError {
    #[error("lecture not found: {0}")]
    LectureNotFound(LectureId),
    #[error("lecture name cannot be empty")]
    EmptyName,
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UnitServiceError {
    /// Line warnings when an import was rejected as a whole.
    #[must_use]
    pub fn import_warnings(&self) -> Option<&[ImportWarning]> {
        match self {
            UnitServiceError::Import(err) => Some(err.warnings()),
            _ => None,
        }
    }
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("course not found: {0}")]
    CourseNotFound(CourseId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
