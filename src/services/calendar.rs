use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};

use crate::db::{BookingStore, ServiceStore};
use crate::errors::AppError;
use crate::models::availability::weekday_name;
use crate::models::{CalendarDay, CalendarProjection};
use crate::services::scheduling::{load_active_service, offered_slots};

/// Number of consecutive days in a calendar projection, today included.
pub const CALENDAR_DAYS: u64 = 30;

/// Per-day slot capacity for `[today, today + 29]`.
///
/// `total_slot_count` is what the day's hours offer; `available_slot_count`
/// subtracts active bookings holding one of those slots.
pub fn get_calendar(
    services: &dyn ServiceStore,
    bookings: &dyn BookingStore,
    service_id: &str,
    today: NaiveDate,
) -> Result<CalendarProjection, AppError> {
    let service = load_active_service(services, service_id)?;

    let end_date = today + Days::new(CALENDAR_DAYS - 1);
    let mut occupied: HashMap<NaiveDate, HashSet<String>> = HashMap::new();
    for booking in bookings
        .active_bookings_between(&service.id, today, end_date)
        .map_err(|e| AppError::internal("Failed to get bookings for calendar", e))?
    {
        occupied.entry(booking.date).or_default().insert(booking.slot);
    }

    let days = today
        .iter_days()
        .take(CALENDAR_DAYS as usize)
        .map(|date| {
            let slots = offered_slots(&service, date);
            let taken = occupied.get(&date);
            let booked = slots
                .iter()
                .filter(|slot| taken.is_some_and(|t| t.contains(&slot.label())))
                .count();

            CalendarDay {
                date,
                weekday: weekday_name(date.weekday()).to_string(),
                has_availability: !slots.is_empty(),
                available_slot_count: slots.len() - booked,
                total_slot_count: slots.len(),
            }
        })
        .collect();

    Ok(CalendarProjection {
        service_id: service.id,
        service_title: service.title,
        start_date: today,
        end_date,
        days,
    })
}
