//! Recurring schedule slots.
//!
//! `hour`, `day` and `week` carry no declared encoding; they are stored and
//! returned verbatim.

use serde::{Deserialize, Serialize};

/// Surrogate key of a `schedule` row.
pub type ScheduleId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub hour: String,
    pub day: String,
    pub week: String,
}
