pub mod availability;
pub mod booking;
pub mod schedule;
pub mod service;
pub mod slot;

pub use availability::{WeekdayRule, WeeklyAvailability};
pub use booking::{Booking, BookingResponse, BookingStatus, NewBooking, ServiceSummary};
pub use schedule::{AvailabilityView, CalendarDay, CalendarProjection, SlotAvailability};
pub use service::{NewService, Service, ServiceStatus};
pub use slot::Slot;
