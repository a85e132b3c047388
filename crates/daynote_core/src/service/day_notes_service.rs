//! Day-level use-case service.
//!
//! # Responsibility
//! - Build the `DayNotes` aggregate for one date or a date range.
//! - Quick-add notes to a date, creating the day on first reference.
//! - Reconcile an edited markdown sheet with storage.
//!
//! # Invariants
//! - Reads never create rows.
//! - Every individual write goes through a repository call and is atomic on
//!   its own; `apply_sheet` validates all referenced ids before its first
//!   write.

use crate::model::day::DayNotes;
use crate::model::note::{Note, NoteId};
use crate::repo::day_repo::DayRepository;
use crate::repo::error::{RecordRef, RepoError};
use crate::repo::note_repo::NoteRepository;
use crate::sheet::{normalize_body, normalize_day_text, ParsedSheet, SheetEntry, SheetError};
use chrono::NaiveDate;
use log::info;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for day-level use cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Edited sheet could not be parsed.
    Sheet(SheetError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Sheet(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent day state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Sheet(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SheetError> for ServiceError {
    fn from(value: SheetError) -> Self {
        Self::Sheet(value)
    }
}

/// Result of reconciling one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSheet {
    /// Day state after all writes.
    pub day: DayNotes,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub day_text_changed: bool,
}

/// Day-level facade over day and note repositories.
pub struct DayNotesService<D: DayRepository, N: NoteRepository> {
    days: D,
    notes: N,
}

impl<D: DayRepository, N: NoteRepository> DayNotesService<D, N> {
    pub fn new(days: D, notes: N) -> Self {
        Self { days, notes }
    }

    /// Aggregate for `date`; empty when the date was never written to.
    pub fn day_notes(&self, date: NaiveDate) -> ServiceResult<DayNotes> {
        let Some(day) = self.days.get_day_by_date(date)? else {
            return Ok(DayNotes::empty(date));
        };
        let notes = self.notes.list_notes_for_day(day.id, false)?;
        Ok(DayNotes::from_day(day, notes))
    }

    /// Adds an open note to `date`, creating the day if needed.
    pub fn add_note(&self, date: NaiveDate, body: &str) -> ServiceResult<Note> {
        let day = self.days.get_or_create_day(date)?;
        Ok(self.notes.create_note(day.id, body)?)
    }

    /// Aggregates for every stored day in `start..=end`, ordered by date.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> ServiceResult<Vec<DayNotes>> {
        let days = self.days.list_days_in_range(start, end)?;
        let mut by_date: HashMap<NaiveDate, Vec<Note>> = HashMap::new();
        for (date, note) in self.notes.list_notes_in_range(start, end)? {
            by_date.entry(date).or_default().push(note);
        }

        Ok(days
            .into_iter()
            .map(|day| {
                let notes = by_date.remove(&day.date).unwrap_or_default();
                DayNotes::from_day(day, notes)
            })
            .collect())
    }

    pub fn complete_note(&self, id: NoteId) -> ServiceResult<Note> {
        Ok(self.notes.complete_note(id)?)
    }

    pub fn soft_delete_note(&self, id: NoteId) -> ServiceResult<()> {
        Ok(self.notes.soft_delete_note(id)?)
    }

    /// Brings storage in line with an edited sheet.
    ///
    /// # Contract
    /// - Listed existing notes get body/completion updated when they differ
    ///   from what the sheet rendered; an untouched sheet writes nothing.
    /// - New entries are created in one write, ticked ones already completed.
    /// - Active notes of the day missing from the sheet are soft-deleted.
    /// - `day_text` is replaced when the sheet's free text differs.
    /// - An id that is not an active note of the sheet's day fails with
    ///   `NotFound` before anything is written.
    pub fn apply_sheet(&self, sheet: &ParsedSheet) -> ServiceResult<AppliedSheet> {
        let existing_day = self.days.get_day_by_date(sheet.date)?;
        if existing_day.is_none() && sheet.entries.is_empty() && sheet.day_text.is_empty() {
            return Ok(AppliedSheet {
                day: DayNotes::empty(sheet.date),
                created: 0,
                updated: 0,
                deleted: 0,
                day_text_changed: false,
            });
        }

        let current = match &existing_day {
            Some(day) => self.notes.list_notes_for_day(day.id, false)?,
            None => Vec::new(),
        };
        let current_by_id: HashMap<NoteId, &Note> =
            current.iter().map(|note| (note.id, note)).collect();
        if let Some(unknown) = sheet
            .listed_ids()
            .find(|id| !current_by_id.contains_key(id))
        {
            return Err(RepoError::NotFound(RecordRef::Note(unknown)).into());
        }

        let day = match existing_day {
            Some(day) => day,
            None => self.days.get_or_create_day(sheet.date)?,
        };

        let (mut created, mut updated) = (0, 0);
        for entry in &sheet.entries {
            match entry {
                SheetEntry::Existing {
                    id,
                    body,
                    completed,
                } => {
                    let note = current_by_id[id];
                    if normalize_body(&note.body) != *body || note.completed != *completed {
                        self.notes.update_note(*id, body, *completed)?;
                        updated += 1;
                    }
                }
                SheetEntry::New { body, completed } => {
                    self.notes.create_note_with_state(day.id, body, *completed)?;
                    created += 1;
                }
            }
        }

        let listed: HashSet<NoteId> = sheet.listed_ids().collect();
        let mut deleted = 0;
        for note in current.iter().filter(|note| !listed.contains(&note.id)) {
            self.notes.soft_delete_note(note.id)?;
            deleted += 1;
        }

        let day_text_changed = sheet.day_text != normalize_day_text(&day.day_text);
        if day_text_changed {
            self.days.update_day_text(day.id, &sheet.day_text)?;
        }

        info!(
            "event=sheet_apply module=service status=ok day_id={} created={created} updated={updated} deleted={deleted} day_text_changed={day_text_changed}",
            day.id
        );

        let day_notes = self.day_notes(sheet.date)?;
        if day_notes.day_id != Some(day.id) {
            return Err(ServiceError::InconsistentState(
                "sheet day missing in read-back",
            ));
        }
        Ok(AppliedSheet {
            day: day_notes,
            created,
            updated,
            deleted,
            day_text_changed,
        })
    }
}
