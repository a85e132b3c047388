//! Error taxonomy shared by all repositories.
//!
//! Raw SQLite failures are classified on the way in, so callers can match on
//! `ConstraintViolation`, `ForeignKeyViolation` or `StorageUnavailable`
//! without inspecting SQLite result codes.

use crate::db::DbError;
use crate::model::day::DayId;
use crate::model::note::NoteId;
use crate::model::schedule::ScheduleId;
use chrono::NaiveDate;
use rusqlite::{ffi, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Identifies the record an operation was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    Day(DayId),
    DayDate(NaiveDate),
    Note(NoteId),
    Schedule(ScheduleId),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day(id) => write!(f, "day {id}"),
            Self::DayDate(date) => write!(f, "day {date}"),
            Self::Note(id) => write!(f, "note {id}"),
            Self::Schedule(id) => write!(f, "schedule {id}"),
        }
    }
}

#[derive(Debug)]
pub enum RepoError {
    /// Unique or not-null constraint breach.
    ConstraintViolation(String),
    /// A note referenced a day that does not exist. `day_id` is `None` when
    /// the breach was only reported by SQLite.
    ForeignKeyViolation { day_id: Option<DayId> },
    /// Target absent, or a note that is already soft-deleted.
    NotFound(RecordRef),
    /// A day still owns notes and cannot be removed.
    DayHasNotes { day_id: DayId, note_count: u32 },
    /// The database is locked, busy or cannot be opened; safe to retry.
    StorageUnavailable(rusqlite::Error),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation(detail) => write!(f, "constraint violation: {detail}"),
            Self::ForeignKeyViolation { day_id: Some(id) } => {
                write!(f, "foreign key violation: day {id} does not exist")
            }
            Self::ForeignKeyViolation { day_id: None } => write!(f, "foreign key violation"),
            Self::NotFound(target) => write!(f, "{target} not found"),
            Self::DayHasNotes {
                day_id,
                note_count,
            } => write!(
                f,
                "day {day_id} still has {note_count} note(s) and cannot be deleted"
            ),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl RepoError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let failure = match &value {
            rusqlite::Error::SqliteFailure(err, message) => {
                Some((err.code, err.extended_code, message.clone()))
            }
            _ => None,
        };

        match failure {
            Some((ErrorCode::ConstraintViolation, extended, _))
                if extended == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Self::ForeignKeyViolation { day_id: None }
            }
            Some((ErrorCode::ConstraintViolation, _, message)) => {
                Self::ConstraintViolation(message.unwrap_or_else(|| value.to_string()))
            }
            Some((
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen,
                _,
                _,
            )) => Self::StorageUnavailable(value),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}
