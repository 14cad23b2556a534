use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::service::{Service, ServiceStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A validated booking about to be written. `provider_id` is copied from the
/// service at creation time and never changes afterwards.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_id: String,
    pub client_id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Accepted,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "rejected" => Some(BookingStatus::Rejected),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Active bookings are the only ones that hold a slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accepted)
    }
}

/// The part of a service shown alongside its bookings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

impl ServiceSummary {
    pub const UNAVAILABLE_TITLE: &'static str = "Service not available";

    /// Placeholder for a booking whose service could not be loaded.
    pub fn unavailable(service_id: &str) -> Self {
        ServiceSummary {
            id: service_id.to_string(),
            title: Self::UNAVAILABLE_TITLE.to_string(),
            category: None,
            price: None,
            status: None,
        }
    }
}

impl From<&Service> for ServiceSummary {
    fn from(s: &Service) -> Self {
        ServiceSummary {
            id: s.id.clone(),
            title: s.title.clone(),
            category: Some(s.category.clone()),
            price: Some(s.price),
            status: Some(s.status),
        }
    }
}

/// A booking as returned to clients and providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: String,
    pub service: ServiceSummary,
    pub client_id: String,
    pub provider_id: String,
    pub date: NaiveDate,
    pub slot: String,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BookingResponse {
    pub fn new(booking: Booking, service: ServiceSummary) -> Self {
        BookingResponse {
            id: booking.id,
            service,
            client_id: booking.client_id,
            provider_id: booking.provider_id,
            date: booking.date,
            slot: booking.slot,
            status: booking.status,
            notes: booking.notes,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}
