use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotAvailability {
    pub time: String,
    pub available: bool,
}

/// Bookable slots for one service on one date, in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub date: NaiveDate,
    pub weekday: String,
    pub slots: Vec<SlotAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub weekday: String,
    pub has_availability: bool,
    pub available_slot_count: usize,
    pub total_slot_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarProjection {
    pub service_id: String,
    pub service_title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<CalendarDay>,
}
