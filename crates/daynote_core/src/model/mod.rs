//! Domain model for the day journal.
//!
//! # Responsibility
//! - Define the records the repositories read and write.
//! - Keep the nullable `deleted_at` column out of domain code by modelling it
//!   as `NoteState`.
//!
//! # Invariants
//! - Every note belongs to exactly one day.
//! - Deletion of notes is a soft-delete tombstone, never a row removal.

pub mod day;
pub mod note;
pub mod schedule;
