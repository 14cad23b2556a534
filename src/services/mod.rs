pub mod availability;
pub mod booking;
pub mod calendar;
pub mod catalog;
pub mod scheduling;
pub mod slots;
pub mod status;
