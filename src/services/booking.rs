use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::db::{BookingStore, CreateBookingError, ServiceStore};
use crate::errors::AppError;
use crate::models::availability::weekday_name;
use crate::models::{Booking, BookingResponse, NewBooking, ServiceStatus, ServiceSummary, Slot, WeekdayRule};
use crate::services::scheduling::{ensure_not_past, load_service, parse_date, rule_for};
use crate::services::slots::slot_labels;
use crate::services::status::Role;

pub const MAX_NOTES_LEN: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub service_id: String,
    pub date: String,
    pub slot: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validates and creates a booking for `client_id`. The first failing check
/// wins; nothing is written unless every check passes.
pub fn create_booking(
    services: &dyn ServiceStore,
    bookings: &dyn BookingStore,
    request: &BookingRequest,
    client_id: &str,
    today: NaiveDate,
) -> Result<Booking, AppError> {
    let date = parse_date(&request.date)?;
    ensure_not_past(date, today)?;
    let slot = Slot::parse(&request.slot)
        .map_err(|_| AppError::BadRequest("Invalid slot format. Use HH:MM-HH:MM".to_string()))?;
    let notes = normalize_notes(request.notes.as_deref())?;

    let service = load_service(services, &request.service_id)?;
    if service.status != ServiceStatus::Active {
        return Err(AppError::BadRequest("Service is not active".to_string()));
    }
    if service.user_id == client_id {
        return Err(AppError::BadRequest(
            "Cannot book your own service".to_string(),
        ));
    }

    let WeekdayRule::Open { start, end } = rule_for(&service, date) else {
        return Err(AppError::BadRequest(format!(
            "Service is not available on {}s",
            weekday_name(date.weekday())
        )));
    };

    let Ok(offered) = slot_labels(start, end) else {
        tracing::warn!(service_id = %service.id, "stored hours have an empty range");
        return Err(AppError::BadRequest(format!(
            "Service is not available on {}s",
            weekday_name(date.weekday())
        )));
    };
    let label = slot.label();
    if !offered.contains(&label) {
        return Err(AppError::BadRequest(
            "Time slot is outside service availability hours".to_string(),
        ));
    }

    let new_booking = NewBooking {
        service_id: service.id.clone(),
        client_id: client_id.to_string(),
        provider_id: service.user_id.clone(),
        date,
        slot: label,
        notes,
    };

    let booking = bookings.create_booking(&new_booking).map_err(|e| match e {
        CreateBookingError::SlotTaken => {
            AppError::Conflict("Time slot is already booked".to_string())
        }
        CreateBookingError::Store(e) => AppError::internal("Failed to create booking", e),
    })?;

    tracing::info!(
        booking_id = %booking.id,
        service_id = %booking.service_id,
        date = %booking.date,
        slot = %booking.slot,
        "booking created"
    );
    Ok(booking)
}

fn normalize_notes(notes: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(AppError::BadRequest(format!(
            "Notes must be at most {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(notes.to_string()))
}

pub fn list_my_bookings(bookings: &dyn BookingStore, client_id: &str) -> Result<Vec<Booking>, AppError> {
    bookings
        .bookings_for_client(client_id)
        .map_err(|e| AppError::internal("Failed to get bookings", e))
}

/// Bookings for a service, visible only to its provider.
pub fn list_service_bookings(
    services: &dyn ServiceStore,
    bookings: &dyn BookingStore,
    service_id: &str,
    actor_id: &str,
) -> Result<Vec<Booking>, AppError> {
    let service = load_service(services, service_id)?;
    if service.user_id != actor_id {
        return Err(AppError::Unauthorized(
            "You don't have permission to view bookings for this service".to_string(),
        ));
    }
    bookings
        .bookings_for_service(&service.id)
        .map_err(|e| AppError::internal("Failed to get bookings", e))
}

/// A single booking for its client or provider. Anyone else gets `NotFound`.
pub fn get_booking(bookings: &dyn BookingStore, booking_id: &str, actor_id: &str) -> Result<Booking, AppError> {
    bookings
        .get_booking(booking_id)
        .map_err(|e| AppError::internal("Failed to get booking", e))?
        .filter(|b| Role::of(b, actor_id).is_some())
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Attaches a service summary to each booking. A service that cannot be
/// loaded is shown as unavailable instead of failing the whole listing.
pub fn with_services(services: &dyn ServiceStore, bookings: Vec<Booking>) -> Vec<BookingResponse> {
    let mut summaries: HashMap<String, ServiceSummary> = HashMap::new();
    bookings
        .into_iter()
        .map(|booking| {
            let summary = summaries
                .entry(booking.service_id.clone())
                .or_insert_with(|| summarize(services, &booking.service_id))
                .clone();
            BookingResponse::new(booking, summary)
        })
        .collect()
}

pub fn with_service(services: &dyn ServiceStore, booking: Booking) -> BookingResponse {
    let summary = summarize(services, &booking.service_id);
    BookingResponse::new(booking, summary)
}

fn summarize(services: &dyn ServiceStore, service_id: &str) -> ServiceSummary {
    match services.get_service(service_id) {
        Ok(Some(service)) => ServiceSummary::from(&service),
        Ok(None) => ServiceSummary::unavailable(service_id),
        Err(e) => {
            tracing::warn!(service_id, error = %format!("{e:#}"), "failed to load service for booking");
            ServiceSummary::unavailable(service_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, NewService, Service};
    use crate::services::fixtures::*;
    use crate::services::status::update_booking_status;

    fn request(service_id: &str, date: &str, slot: &str) -> BookingRequest {
        BookingRequest {
            service_id: service_id.to_string(),
            date: date.to_string(),
            slot: slot.to_string(),
            notes: Some("  first visit  ".to_string()),
        }
    }

    #[test]
    fn test_creates_pending_booking_with_provider_from_service() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let booking =
            create_booking(&conn, &conn, &request(&service.id, "2030-06-17", "09:30-10:00"), CLIENT, today()).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.provider_id, PROVIDER);
        assert_eq!(booking.client_id, CLIENT);
        assert_eq!(booking.slot, "09:30-10:00");
        assert_eq!(booking.notes.as_deref(), Some("first visit"));
        assert_eq!(conn.get_booking(&booking.id).unwrap().unwrap().provider_id, PROVIDER);
    }

    #[test]
    fn test_today_is_bookable() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        assert!(create_booking(&conn, &conn, &request(&service.id, "2030-06-10", "09:00-09:30"), CLIENT, today()).is_ok());
    }

    #[test]
    fn test_input_validation() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let cases = [
            ("2030/06/17", "09:00-09:30"),
            ("2030-06-09", "09:00-09:30"),
            ("2030-06-17", "9:00-9:30"),
            ("2030-06-17", "09:00_09:30"),
            ("2030-06-17", "09:00-24:00"),
        ];
        for (date, slot) in cases {
            let err = create_booking(&conn, &conn, &request(&service.id, date, slot), CLIENT, today()).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{date} {slot}");
        }

        let mut long = request(&service.id, "2030-06-17", "09:00-09:30");
        long.notes = Some("x".repeat(MAX_NOTES_LEN + 1));
        assert!(matches!(
            create_booking(&conn, &conn, &long, CLIENT, today()),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_input_checks_run_before_service_lookup() {
        let conn = setup_db();
        let err = create_booking(&conn, &conn, &request("missing", "2030-06-09", "09:00-09:30"), CLIENT, today())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = create_booking(&conn, &conn, &request("missing", "2030-06-17", "09:00-09:30"), CLIENT, today())
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_service_rules() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let err = create_booking(&conn, &conn, &request(&service.id, "2030-06-17", "09:00-09:30"), PROVIDER, today())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("own service")));

        conn.set_service_status(&service.id, ServiceStatus::Inactive, PROVIDER).unwrap();
        let err = create_booking(&conn, &conn, &request(&service.id, "2030-06-17", "09:00-09:30"), CLIENT, today())
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("not active")));
    }

    #[test]
    fn test_slot_must_be_a_generated_slot() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let cases = [
            ("2030-06-16", "09:00-09:30"), // Sunday, closed
            ("2030-06-17", "08:30-09:00"), // before opening
            ("2030-06-17", "12:00-12:30"), // after closing
            ("2030-06-17", "09:15-09:45"), // misaligned
            ("2030-06-17", "09:00-10:00"), // wider than one slot
            ("2030-06-15", "10:30-11:00"), // Saturday partial tail
        ];
        for (date, slot) in cases {
            let err = create_booking(&conn, &conn, &request(&service.id, date, slot), CLIENT, today()).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{date} {slot}");
        }
    }

    #[test]
    fn test_second_booking_conflicts_until_first_is_rejected() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        let req = request(&service.id, "2030-06-17", "10:00-10:30");

        let first = create_booking(&conn, &conn, &req, CLIENT, today()).unwrap();
        let err = create_booking(&conn, &conn, &req, "client-2", today()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        update_booking_status(&conn, &first.id, "rejected", PROVIDER).unwrap();
        assert!(create_booking(&conn, &conn, &req, "client-2", today()).is_ok());
    }

    #[test]
    fn test_listings_respect_ownership() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        let other: Service = conn
            .create_service(&NewService {
                user_id: "provider-2".to_string(),
                title: "Lessons".to_string(),
                description: "Guitar".to_string(),
                category: "Música".to_string(),
                price: 10.0,
                availability: WEEKLY.to_string(),
            })
            .unwrap();
        let booking =
            create_booking(&conn, &conn, &request(&service.id, "2030-06-17", "09:00-09:30"), CLIENT, today()).unwrap();
        create_booking(&conn, &conn, &request(&other.id, "2030-06-17", "09:00-09:30"), CLIENT, today()).unwrap();

        assert_eq!(list_my_bookings(&conn, CLIENT).unwrap().len(), 2);
        assert_eq!(list_service_bookings(&conn, &conn, &service.id, PROVIDER).unwrap().len(), 1);
        assert!(matches!(
            list_service_bookings(&conn, &conn, &service.id, "provider-2"),
            Err(AppError::Unauthorized(_))
        ));

        assert_eq!(get_booking(&conn, &booking.id, CLIENT).unwrap().id, booking.id);
        assert_eq!(get_booking(&conn, &booking.id, PROVIDER).unwrap().id, booking.id);
        assert!(matches!(get_booking(&conn, &booking.id, "provider-2"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_responses_carry_service_summary() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        for slot in ["09:00-09:30", "09:30-10:00"] {
            create_booking(&conn, &conn, &request(&service.id, "2030-06-17", slot), CLIENT, today()).unwrap();
        }

        let responses = with_services(&conn, list_my_bookings(&conn, CLIENT).unwrap());
        assert_eq!(responses.len(), 2);
        for response in &responses {
            assert_eq!(response.service.id, service.id);
            assert_eq!(response.service.title, "Haircut");
            assert_eq!(response.service.status, Some(ServiceStatus::Active));
        }
    }

    #[test]
    fn test_unloadable_service_shown_as_unavailable() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        let booking =
            create_booking(&conn, &conn, &request(&service.id, "2030-06-17", "09:00-09:30"), CLIENT, today()).unwrap();

        let response = with_service(&FailingStore, booking);
        assert_eq!(response.service, ServiceSummary::unavailable(&service.id));
        assert_eq!(response.service.title, "Service not available");
        assert_eq!(response.slot, "09:00-09:30");
    }

    #[test]
    fn test_service_lookup_failure_is_internal() {
        let conn = setup_db();
        let err = create_booking(&FailingStore, &conn, &request("any", "2030-06-17", "09:00-09:30"), CLIENT, today())
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_booking_store_failure_is_internal() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        let err = create_booking(&conn, &FailingStore, &request(&service.id, "2030-06-17", "09:00-09:30"), CLIENT, today())
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(list_my_bookings(&conn, CLIENT).unwrap().is_empty());
    }
}
