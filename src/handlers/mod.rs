pub mod bookings;
pub mod health;
pub mod services;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::Router;

use crate::errors::AppError;
use crate::state::AppState;

/// Header carrying the caller's user id, set by the authenticating gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn actor_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/categories", get(services::list_categories))
        .route("/api/services", post(services::create_service))
        .route("/api/services/mine", get(services::list_my_services))
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/services/:id/status",
            patch(services::update_service_status),
        )
        .route(
            "/api/services/:id/availability",
            get(services::get_availability),
        )
        .route("/api/services/:id/calendar", get(services::get_calendar))
        .route(
            "/api/services/:id/bookings",
            get(services::list_service_bookings),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/mine", get(bookings::list_my_bookings))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route(
            "/api/bookings/:id/status",
            patch(bookings::update_booking_status),
        )
        .with_state(state)
}
