//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, edit, soft-delete and list notes attached to days.
//! - Keep `day.task_count` equal to the number of active notes of that day.
//!
//! # Invariants
//! - Inserts and soft-deletes update the parent counter in the same
//!   `IMMEDIATE` transaction; a failed step rolls back both.
//! - Soft-deleted notes are never edited and never deleted twice; both
//!   surface as `NotFound`.
//! - Lists are ordered by `created_at ASC, id ASC`.

use crate::model::day::DayId;
use crate::model::note::{Note, NoteId, NoteState};
use crate::repo::error::{RecordRef, RepoError, RepoResult};
use crate::repo::{ensure_connection_ready, DAY_COLUMNS, NOTE_COLUMNS};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    day_key,
    body,
    completed,
    created_at,
    updated_at,
    deleted_at
FROM note";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Creates an open note under `day_id` and bumps the day's counter.
    fn create_note(&self, day_id: DayId, body: &str) -> RepoResult<Note> {
        self.create_note_with_state(day_id, body, false)
    }
    /// Creates a note with the given completion flag in a single write.
    /// `updated_at` stays empty either way.
    fn create_note_with_state(
        &self,
        day_id: DayId,
        body: &str,
        completed: bool,
    ) -> RepoResult<Note>;
    fn get_note(&self, id: NoteId, include_deleted: bool) -> RepoResult<Option<Note>>;
    /// Marks an active note as completed.
    fn complete_note(&self, id: NoteId) -> RepoResult<Note>;
    /// Replaces body and completion flag of an active note.
    fn update_note(&self, id: NoteId, body: &str, completed: bool) -> RepoResult<Note>;
    /// Tombstones an active note and decrements the day's counter.
    fn soft_delete_note(&self, id: NoteId) -> RepoResult<()>;
    fn list_notes_for_day(&self, day_id: DayId, include_deleted: bool) -> RepoResult<Vec<Note>>;
    /// Active notes of every day in `start..=end`, grouped by date order.
    fn list_notes_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<(NaiveDate, Note)>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("day", DAY_COLUMNS), ("note", NOTE_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note_with_state(
        &self,
        day_id: DayId,
        body: &str,
        completed: bool,
    ) -> RepoResult<Note> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let bumped = tx.execute(
            "UPDATE day SET task_count = task_count + 1 WHERE id = ?1;",
            [day_id],
        )?;
        if bumped == 0 {
            return Err(RepoError::ForeignKeyViolation {
                day_id: Some(day_id),
            });
        }

        tx.execute(
            "INSERT INTO note (body, completed, created_at, day_key)
             VALUES (?1, ?2, ?3, ?4);",
            params![body, bool_to_int(completed), Utc::now(), day_id],
        )?;
        let id = tx.last_insert_rowid();
        let note = load_note(&tx, id, false)?.ok_or_else(|| RepoError::InvalidData(format!(
            "note {id} missing right after insert"
        )))?;
        tx.commit()?;

        info!(
            "event=note_create module=repo status=ok note_id={id} day_id={day_id} completed={completed}"
        );
        Ok(note)
    }

    fn get_note(&self, id: NoteId, include_deleted: bool) -> RepoResult<Option<Note>> {
        load_note(self.conn, id, include_deleted)
    }

    fn complete_note(&self, id: NoteId) -> RepoResult<Note> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE note
             SET
                completed = 1,
                updated_at = ?2
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![id, Utc::now()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Note(id)));
        }

        let note = load_note(&tx, id, false)?.ok_or(RepoError::NotFound(RecordRef::Note(id)))?;
        tx.commit()?;

        info!("event=note_complete module=repo status=ok note_id={id}");
        Ok(note)
    }

    fn update_note(&self, id: NoteId, body: &str, completed: bool) -> RepoResult<Note> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE note
             SET
                body = ?2,
                completed = ?3,
                updated_at = ?4
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![id, body, bool_to_int(completed), Utc::now()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(RecordRef::Note(id)));
        }

        let note = load_note(&tx, id, false)?.ok_or(RepoError::NotFound(RecordRef::Note(id)))?;
        tx.commit()?;

        info!("event=note_update module=repo status=ok note_id={id}");
        Ok(note)
    }

    fn soft_delete_note(&self, id: NoteId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let day_id: Option<DayId> = tx
            .query_row(
                "SELECT day_key FROM note WHERE id = ?1 AND deleted_at IS NULL;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(day_id) = day_id else {
            return Err(RepoError::NotFound(RecordRef::Note(id)));
        };

        tx.execute(
            "UPDATE note SET deleted_at = ?2 WHERE id = ?1;",
            params![id, Utc::now()],
        )?;
        tx.execute(
            "UPDATE day SET task_count = task_count - 1 WHERE id = ?1;",
            [day_id],
        )?;
        tx.commit()?;

        info!("event=note_soft_delete module=repo status=ok note_id={id} day_id={day_id}");
        Ok(())
    }

    fn list_notes_for_day(&self, day_id: DayId, include_deleted: bool) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE day_key = ?1
               AND (?2 = 1 OR deleted_at IS NULL)
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![day_id, bool_to_int(include_deleted)])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn list_notes_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<(NaiveDate, Note)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                n.id AS id,
                n.day_key AS day_key,
                n.body AS body,
                n.completed AS completed,
                n.created_at AS created_at,
                n.updated_at AS updated_at,
                n.deleted_at AS deleted_at,
                d.date AS date
             FROM note n
             INNER JOIN day d ON d.id = n.day_key
             WHERE d.date BETWEEN ?1 AND ?2
               AND n.deleted_at IS NULL
             ORDER BY d.date ASC, n.created_at ASC, n.id ASC;",
        )?;
        let mut rows = stmt.query(params![start, end])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            let date: NaiveDate = row.get("date")?;
            notes.push((date, parse_note_row(row)?));
        }
        Ok(notes)
    }
}

fn load_note(conn: &Connection, id: NoteId, include_deleted: bool) -> RepoResult<Option<Note>> {
    conn.query_row(
        &format!(
            "{NOTE_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ),
        params![id, bool_to_int(include_deleted)],
        |row| Ok(parse_note_row(row)),
    )
    .optional()?
    .transpose()
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: NoteId = row.get("id")?;
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in note.completed for note {id}"
            )));
        }
    };
    let deleted_at: Option<DateTime<Utc>> = row.get("deleted_at")?;

    Ok(Note {
        id,
        day_id: row.get("day_key")?,
        body: row.get("body")?,
        completed,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        state: NoteState::from_deleted_at(deleted_at),
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
