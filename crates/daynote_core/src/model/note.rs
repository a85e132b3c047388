//! Note (task) domain model.
//!
//! # Responsibility
//! - Define the canonical note record attached to a day.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `state` is the source of truth for tombstone state; it maps 1:1 onto the
//!   nullable `note.deleted_at` column.
//! - `created_at` never changes after insert.

use crate::model::day::DayId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate key of a `note` row.
pub type NoteId = i64;

/// Logical presence of a note.
///
/// A deleted note stays physically stored but is hidden from default views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NoteState {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl NoteState {
    /// Translates the storage column into the domain state.
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Self::Deleted { at },
            None => Self::Active,
        }
    }

    /// Translates the domain state back into the storage column.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A task or note entry attached to a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Owning day (`note.day_key`).
    pub day_id: DayId,
    pub body: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Set on every edit, `None` until the first one.
    pub updated_at: Option<DateTime<Utc>>,
    pub state: NoteState,
}

impl Note {
    /// Returns whether this note should be considered visible.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.state.deleted_at()
    }
}

#[cfg(test)]
mod tests {
    use super::NoteState;
    use chrono::{TimeZone, Utc};

    #[test]
    fn state_maps_nullable_column_both_ways() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();

        assert_eq!(NoteState::from_deleted_at(None), NoteState::Active);
        assert_eq!(
            NoteState::from_deleted_at(Some(at)),
            NoteState::Deleted { at }
        );
        assert_eq!(NoteState::Deleted { at }.deleted_at(), Some(at));
        assert!(NoteState::Active.is_active());
        assert!(!NoteState::Deleted { at }.is_active());
    }

    #[test]
    fn state_serializes_as_tagged_variant() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();

        let active = serde_json::to_value(NoteState::Active).unwrap();
        assert_eq!(active, serde_json::json!({ "state": "active" }));

        let deleted = serde_json::to_value(NoteState::Deleted { at }).unwrap();
        assert_eq!(deleted["state"], "deleted");
        assert_eq!(deleted["at"], "2024-01-01T08:30:00Z");
    }
}
