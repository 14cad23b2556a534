use chrono::{Duration, NaiveTime};

use crate::models::availability::format_time;
use crate::models::Slot;

/// Every slot has this fixed width.
pub const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("start time {start} must be before end time {end}")]
    InvalidRange { start: String, end: String },
}

/// Enumerates the fixed-width slots in `[start, end)`, earliest first.
///
/// The first slot starts exactly at `start`. A trailing interval shorter than
/// the slot width is dropped, so a window narrower than one slot yields an
/// empty list. `start >= end` is an error.
pub fn generate_slots(start: NaiveTime, end: NaiveTime) -> Result<Vec<Slot>, SlotError> {
    if start >= end {
        return Err(SlotError::InvalidRange {
            start: format_time(start),
            end: format_time(end),
        });
    }

    let width = Duration::minutes(SLOT_MINUTES);
    let mut slots = Vec::new();
    let mut cursor = start;
    // `end` is at most 23:59, so while `end - cursor >= width` the addition
    // cannot wrap past midnight.
    while end - cursor >= width {
        let slot_end = cursor + width;
        slots.push(Slot { start: cursor, end: slot_end });
        cursor = slot_end;
    }
    Ok(slots)
}

/// Labels of the generated slots, for membership checks.
pub fn slot_labels(start: NaiveTime, end: NaiveTime) -> Result<Vec<String>, SlotError> {
    Ok(generate_slots(start, end)?.iter().map(Slot::label).collect())
}
