//! Schedule repository contracts and SQLite implementation.
//!
//! Schedules are unconstrained: no relation to days or notes, and the three
//! descriptor columns are stored verbatim.

use crate::model::schedule::{Schedule, ScheduleId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, SCHEDULE_COLUMNS};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for schedule operations.
pub trait ScheduleRepository {
    fn create_schedule(&self, hour: &str, day: &str, week: &str) -> RepoResult<Schedule>;
    fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>>;
    /// All schedules in insertion order.
    fn list_schedules(&self) -> RepoResult<Vec<Schedule>>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("schedule", SCHEDULE_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn create_schedule(&self, hour: &str, day: &str, week: &str) -> RepoResult<Schedule> {
        self.conn.execute(
            "INSERT INTO schedule (hour, day, week) VALUES (?1, ?2, ?3);",
            params![hour, day, week],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("event=schedule_create module=repo status=ok schedule_id={id}");

        self.get_schedule(id)?.ok_or_else(|| RepoError::InvalidData(format!(
            "schedule {id} missing right after insert"
        )))
    }

    fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>> {
        let schedule = self
            .conn
            .query_row(
                "SELECT id, hour, day, week FROM schedule WHERE id = ?1;",
                [id],
                parse_schedule_row,
            )
            .optional()?;
        Ok(schedule)
    }

    fn list_schedules(&self) -> RepoResult<Vec<Schedule>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, hour, day, week FROM schedule ORDER BY id ASC;")?;
        let schedules = stmt
            .query_map([], parse_schedule_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(schedules)
    }
}

fn parse_schedule_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get("id")?,
        hour: row.get("hour")?,
        day: row.get("day")?,
        week: row.get("week")?,
    })
}
