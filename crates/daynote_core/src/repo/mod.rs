//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for days, notes and
//!   schedules.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every mutation that changes the set of active notes also adjusts
//!   `day.task_count` inside the same `IMMEDIATE` transaction.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `ForeignKeyViolation`, ...) instead of raw SQLite failures.

pub mod day_repo;
pub mod error;
pub mod note_repo;
pub mod schedule_repo;

use crate::db::migrations::latest_version;
use self::error::{RepoError, RepoResult};
use rusqlite::Connection;

/// Rejects connections that were not opened through `db::open_db*`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) const DAY_COLUMNS: &[&str] = &["id", "task_count", "date", "day_text"];
pub(crate) const NOTE_COLUMNS: &[&str] = &[
    "id",
    "body",
    "completed",
    "created_at",
    "updated_at",
    "deleted_at",
    "day_key",
];
pub(crate) const SCHEDULE_COLUMNS: &[&str] = &["id", "hour", "day", "week"];
