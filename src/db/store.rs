use chrono::{NaiveDate, Utc};
use rusqlite::Connection;

use super::queries;
use crate::models::{Booking, BookingStatus, NewBooking, NewService, Service, ServiceStatus};

/// Read/write access to services, as the scheduling engine needs it.
pub trait ServiceStore {
    fn get_service(&self, id: &str) -> anyhow::Result<Option<Service>>;

    fn services_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Service>>;

    fn create_service(&self, service: &NewService) -> anyhow::Result<Service>;

    /// Scoped to the owner; returns rows affected.
    fn set_service_status(&self, id: &str, status: ServiceStatus, user_id: &str) -> anyhow::Result<usize>;

    /// Writes the editable fields of `service`, scoped to `service.user_id`.
    fn update_service(&self, service: &Service) -> anyhow::Result<usize>;

    /// Removes the service and its bookings, scoped to the owner.
    fn delete_service(&self, id: &str, user_id: &str) -> anyhow::Result<usize>;
}

#[derive(Debug, thiserror::Error)]
pub enum CreateBookingError {
    #[error("slot already booked")]
    SlotTaken,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Booking persistence. `create_booking` must reject a second active booking
/// for the same (service, date, slot) atomically with the insert.
pub trait BookingStore {
    fn create_booking(&self, booking: &NewBooking) -> Result<Booking, CreateBookingError>;

    fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>>;

    fn bookings_for_client(&self, client_id: &str) -> anyhow::Result<Vec<Booking>>;

    fn bookings_for_service(&self, service_id: &str) -> anyhow::Result<Vec<Booking>>;

    /// Pending and accepted bookings between two dates, both inclusive.
    fn active_bookings_between(
        &self,
        service_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Booking>>;

    fn count_active_bookings(&self, service_id: &str) -> anyhow::Result<usize>;

    fn active_bookings_on(&self, service_id: &str, date: NaiveDate) -> anyhow::Result<Vec<Booking>> {
        self.active_bookings_between(service_id, date, date)
    }

    /// Moves a booking from `expected` to `status` if `actor_id` is its client
    /// or provider. Returns rows affected.
    fn set_booking_status(
        &self,
        id: &str,
        expected: BookingStatus,
        status: BookingStatus,
        actor_id: &str,
    ) -> anyhow::Result<usize>;
}

impl ServiceStore for Connection {
    fn get_service(&self, id: &str) -> anyhow::Result<Option<Service>> {
        queries::get_service(self, id)
    }

    fn services_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Service>> {
        queries::get_services_for_user(self, user_id)
    }

    fn create_service(&self, service: &NewService) -> anyhow::Result<Service> {
        let now = Utc::now().naive_utc();
        let service = Service {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: service.user_id.clone(),
            title: service.title.clone(),
            description: service.description.clone(),
            category: service.category.clone(),
            price: service.price,
            availability: service.availability.clone(),
            status: ServiceStatus::Active,
            created_at: now,
            updated_at: now,
        };
        queries::insert_service(self, &service)?;
        Ok(service)
    }

    fn set_service_status(&self, id: &str, status: ServiceStatus, user_id: &str) -> anyhow::Result<usize> {
        queries::update_service_status(self, id, status, user_id, Utc::now().naive_utc())
    }

    fn update_service(&self, service: &Service) -> anyhow::Result<usize> {
        let service = Service {
            updated_at: Utc::now().naive_utc(),
            ..service.clone()
        };
        queries::update_service(self, &service)
    }

    fn delete_service(&self, id: &str, user_id: &str) -> anyhow::Result<usize> {
        queries::delete_service(self, id, user_id)
    }
}

impl BookingStore for Connection {
    fn create_booking(&self, booking: &NewBooking) -> Result<Booking, CreateBookingError> {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            service_id: booking.service_id.clone(),
            client_id: booking.client_id.clone(),
            provider_id: booking.provider_id.clone(),
            date: booking.date,
            slot: booking.slot.clone(),
            status: BookingStatus::Pending,
            notes: booking.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        queries::insert_booking(self, &booking)?;
        Ok(booking)
    }

    fn get_booking(&self, id: &str) -> anyhow::Result<Option<Booking>> {
        queries::get_booking(self, id)
    }

    fn bookings_for_client(&self, client_id: &str) -> anyhow::Result<Vec<Booking>> {
        queries::get_bookings_for_client(self, client_id)
    }

    fn bookings_for_service(&self, service_id: &str) -> anyhow::Result<Vec<Booking>> {
        queries::get_bookings_for_service(self, service_id)
    }

    fn active_bookings_between(
        &self,
        service_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<Booking>> {
        queries::get_active_bookings_between(self, service_id, from, to)
    }

    fn count_active_bookings(&self, service_id: &str) -> anyhow::Result<usize> {
        queries::count_active_bookings_for_service(self, service_id)
    }

    fn set_booking_status(
        &self,
        id: &str,
        expected: BookingStatus,
        status: BookingStatus,
        actor_id: &str,
    ) -> anyhow::Result<usize> {
        queries::update_booking_status(self, id, expected, status, actor_id, Utc::now().naive_utc())
    }
}
