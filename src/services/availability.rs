use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::db::{BookingStore, ServiceStore};
use crate::errors::AppError;
use crate::models::availability::weekday_name;
use crate::models::{AvailabilityView, SlotAvailability};
use crate::services::scheduling::{ensure_not_past, load_active_service, offered_slots, parse_date};

/// Bookable slots for one service on one date.
///
/// Every slot the day's hours produce is listed in order; a slot is
/// unavailable iff an active booking holds exactly its label. A closed day is
/// an empty list, not an error.
pub fn get_availability(
    services: &dyn ServiceStore,
    bookings: &dyn BookingStore,
    service_id: &str,
    date: &str,
    today: NaiveDate,
) -> Result<AvailabilityView, AppError> {
    let date = parse_date(date)?;
    ensure_not_past(date, today)?;
    let service = load_active_service(services, service_id)?;

    let weekday = weekday_name(date.weekday()).to_string();
    let slots = offered_slots(&service, date);
    if slots.is_empty() {
        return Ok(AvailabilityView {
            date,
            weekday,
            slots: Vec::new(),
        });
    }

    let occupied: HashSet<String> = bookings
        .active_bookings_on(&service.id, date)
        .map_err(|e| AppError::internal("Failed to get occupied slots", e))?
        .into_iter()
        .map(|b| b.slot)
        .collect();

    let slots = slots
        .iter()
        .map(|slot| {
            let time = slot.label();
            let available = !occupied.contains(&time);
            SlotAvailability { time, available }
        })
        .collect();

    Ok(AvailabilityView {
        date,
        weekday,
        slots,
    })
}
