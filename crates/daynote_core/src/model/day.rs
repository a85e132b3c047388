//! Day records and the per-day read aggregate.

use crate::model::note::Note;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Surrogate key of a `day` row.
pub type DayId = i64;

/// One calendar day tracked by the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub id: DayId,
    /// Unique across all days.
    pub date: NaiveDate,
    /// Number of active notes attached to this day. Maintained by the
    /// repositories in the same transaction as the note change.
    pub task_count: u32,
    /// Free-form text shown under the day's notes.
    pub day_text: String,
}

/// Everything shown for a single date: the day row (if any) plus its active
/// notes in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNotes {
    pub date: NaiveDate,
    /// `None` while the date has never been written to.
    pub day_id: Option<DayId>,
    pub day_text: String,
    pub notes: Vec<Note>,
    pub note_count: u32,
}

impl DayNotes {
    /// Aggregate for a date that has no `day` row yet.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            day_id: None,
            day_text: String::new(),
            notes: Vec::new(),
            note_count: 0,
        }
    }

    /// Builds the aggregate from a stored day and its active notes.
    pub fn from_day(day: Day, notes: Vec<Note>) -> Self {
        Self {
            date: day.date,
            day_id: Some(day.id),
            day_text: day.day_text,
            note_count: notes.len() as u32,
            notes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
