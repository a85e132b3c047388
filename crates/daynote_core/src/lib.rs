//! Core storage and domain logic for daynote.
//! This crate is the single source of truth for the day/note invariants,
//! most importantly `day.task_count == active notes of that day`.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sheet;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::day::{Day, DayId, DayNotes};
pub use model::note::{Note, NoteId, NoteState};
pub use model::schedule::{Schedule, ScheduleId};
pub use repo::day_repo::{DayRepository, SqliteDayRepository, TaskCountDrift};
pub use repo::error::{RecordRef, RepoError, RepoResult};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
pub use service::day_notes_service::{AppliedSheet, DayNotesService, ServiceError, ServiceResult};
pub use sheet::{ParsedSheet, SheetEntry, SheetError};
