//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into day-level use cases.
//! - Keep the CLI decoupled from storage details.

pub mod day_notes_service;
