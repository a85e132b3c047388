//! Day repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, read and relabel `day` rows.
//! - Own the day deletion policy and the task-count audit.
//!
//! # Invariants
//! - `day.date` is unique; duplicate inserts surface as `ConstraintViolation`.
//! - A day that still owns any note row (active or soft-deleted) is never
//!   deleted.
//! - `task_count` is only ever written here by `repair_task_counts`; regular
//!   counter maintenance lives with the note mutations.

use crate::model::day::{Day, DayId};
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, DAY_COLUMNS, NOTE_COLUMNS};
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const DAY_SELECT_SQL: &str = "SELECT
    id,
    date,
    task_count,
    day_text
FROM day";

/// A day whose stored counter disagrees with its active notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCountDrift {
    pub day_id: DayId,
    pub date: NaiveDate,
    pub stored: i64,
    pub actual: i64,
}

/// Repository interface for day operations.
pub trait DayRepository {
    /// Inserts a new day with `task_count = 0`.
    fn create_day(&self, date: NaiveDate, day_text: &str) -> RepoResult<Day>;
    fn get_day(&self, id: DayId) -> RepoResult<Option<Day>>;
    fn get_day_by_date(&self, date: NaiveDate) -> RepoResult<Option<Day>>;
    /// Returns the day for `date`, inserting an empty one on first reference.
    fn get_or_create_day(&self, date: NaiveDate) -> RepoResult<Day>;
    fn update_day_text(&self, id: DayId, day_text: &str) -> RepoResult<Day>;
    /// Days with `start <= date <= end`, ordered by date.
    fn list_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Day>>;
    /// Deletes a day that owns no notes; fails with `DayHasNotes` otherwise.
    fn delete_day(&self, id: DayId) -> RepoResult<()>;
    /// Recomputes every counter and reports the ones that drifted.
    fn audit_task_counts(&self) -> RepoResult<Vec<TaskCountDrift>>;
    /// Rewrites drifted counters; returns how many days were fixed.
    fn repair_task_counts(&self) -> RepoResult<usize>;
}

/// SQLite-backed day repository.
pub struct SqliteDayRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDayRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("day", DAY_COLUMNS), ("note", NOTE_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl DayRepository for SqliteDayRepository<'_> {
    fn create_day(&self, date: NaiveDate, day_text: &str) -> RepoResult<Day> {
        self.conn.execute(
            "INSERT INTO day (task_count, date, day_text) VALUES (0, ?1, ?2);",
            params![date, day_text],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("event=day_create module=repo status=ok day_id={id}");

        load_day(self.conn, id)?.ok_or_else(|| RepoError::InvalidData(format!(
            "day {id} missing right after insert"
        )))
    }

    fn get_day(&self, id: DayId) -> RepoResult<Option<Day>> {
        load_day(self.conn, id)
    }

    fn get_day_by_date(&self, date: NaiveDate) -> RepoResult<Option<Day>> {
        self.conn
            .query_row(
                &format!("{DAY_SELECT_SQL} WHERE date = ?1;"),
                [date],
                |row| Ok(parse_day_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn get_or_create_day(&self, date: NaiveDate) -> RepoResult<Day> {
        // Concurrent first references collapse onto the unique date index.
        let inserted = self.conn.execute(
            "INSERT INTO day (task_count, date, day_text) VALUES (0, ?1, '')
             ON CONFLICT (date) DO NOTHING;",
            [date],
        )?;
        if inserted == 1 {
            info!(
                "event=day_create module=repo status=ok day_id={}",
                self.conn.last_insert_rowid()
            );
        }

        self.get_day_by_date(date)?
            .ok_or(RepoError::NotFound(RecordRef::DayDate(date)))
    }

    fn update_day_text(&self, id: DayId, day_text: &str) -> RepoResult<Day> {
        let changed = self.conn.execute(
            "UPDATE day SET day_text = ?2 WHERE id = ?1;",
            params![id, day_text],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Day(id)));
        }

        load_day(self.conn, id)?.ok_or(RepoError::NotFound(RecordRef::Day(id)))
    }

    fn list_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Day>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DAY_SELECT_SQL}
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC;"
        ))?;
        let mut rows = stmt.query(params![start, end])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            days.push(parse_day_row(row)?);
        }
        Ok(days)
    }

    fn delete_day(&self, id: DayId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_day(&tx, id)?.is_none() {
            return Err(RepoError::NotFound(RecordRef::Day(id)));
        }

        let note_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM note WHERE day_key = ?1;",
            [id],
            |row| row.get(0),
        )?;
        if note_count > 0 {
            return Err(RepoError::DayHasNotes {
                day_id: id,
                note_count: note_count as u32,
            });
        }

        tx.execute("DELETE FROM day WHERE id = ?1;", [id])?;
        tx.commit()?;
        info!("event=day_delete module=repo status=ok day_id={id}");
        Ok(())
    }

    fn audit_task_counts(&self) -> RepoResult<Vec<TaskCountDrift>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, stored, actual
             FROM (
                SELECT
                    d.id AS id,
                    d.date AS date,
                    d.task_count AS stored,
                    (SELECT COUNT(*)
                     FROM note n
                     WHERE n.day_key = d.id
                       AND n.deleted_at IS NULL) AS actual
                FROM day d
             )
             WHERE stored != actual
             ORDER BY date ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut drifts = Vec::new();
        while let Some(row) = rows.next()? {
            drifts.push(TaskCountDrift {
                day_id: row.get("id")?,
                date: row.get("date")?,
                stored: row.get("stored")?,
                actual: row.get("actual")?,
            });
        }

        if !drifts.is_empty() {
            warn!(
                "event=task_count_audit module=repo status=drift days={}",
                drifts.len()
            );
        }
        Ok(drifts)
    }

    fn repair_task_counts(&self) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let fixed = tx.execute(
            "UPDATE day
             SET task_count = (
                SELECT COUNT(*)
                FROM note n
                WHERE n.day_key = day.id
                  AND n.deleted_at IS NULL
             )
             WHERE task_count != (
                SELECT COUNT(*)
                FROM note n
                WHERE n.day_key = day.id
                  AND n.deleted_at IS NULL
             );",
            [],
        )?;
        tx.commit()?;

        info!("event=task_count_repair module=repo status=ok days={fixed}");
        Ok(fixed)
    }
}

/// Loads one day by id. Shared with the note repository, which reads the
/// parent row inside its own transactions.
pub(crate) fn load_day(conn: &Connection, id: DayId) -> RepoResult<Option<Day>> {
    conn.query_row(&format!("{DAY_SELECT_SQL} WHERE id = ?1;"), [id], |row| {
        Ok(parse_day_row(row))
    })
    .optional()?
    .transpose()
}

fn parse_day_row(row: &Row<'_>) -> RepoResult<Day> {
    let id: DayId = row.get("id")?;
    let raw_count: i64 = row.get("task_count")?;
    let task_count = u32::try_from(raw_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid task_count `{raw_count}` in day.task_count for day {id}"
        ))
    })?;

    Ok(Day {
        id,
        date: row.get("date")?,
        task_count,
        day_text: row.get("day_text")?,
    })
}
