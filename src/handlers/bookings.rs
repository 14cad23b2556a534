use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use super::actor_id;
use super::services::StatusRequest;
use crate::errors::AppError;
use crate::models::BookingResponse;
use crate::services::booking::{self, BookingRequest};
use crate::services::status;
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let client = actor_id(&headers)?;
    let created = {
        let db = state.db()?;
        let created = booking::create_booking(&*db, &*db, &request, &client, state.today())?;
        booking::with_service(&*db, created)
    };
    Ok((StatusCode::CREATED, Json(created)))
}

// GET /api/bookings/mine
pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let client = actor_id(&headers)?;
    let bookings = {
        let db = state.db()?;
        let found = booking::list_my_bookings(&*db, &client)?;
        booking::with_services(&*db, found)
    };
    Ok(Json(bookings))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let actor = actor_id(&headers)?;
    let found = {
        let db = state.db()?;
        let found = booking::get_booking(&*db, &id, &actor)?;
        booking::with_service(&*db, found)
    };
    Ok(Json(found))
}

// PATCH /api/bookings/:id/status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = actor_id(&headers)?;
    let new_status = {
        let db = state.db()?;
        status::update_booking_status(&*db, &id, &request.status, &actor)?
    };
    Ok(Json(serde_json::json!({
        "id": id,
        "status": new_status.as_str(),
        "message": format!("Booking {} successfully", new_status.as_str()),
    })))
}
