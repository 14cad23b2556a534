use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::actor_id;
use crate::errors::AppError;
use crate::models::{AvailabilityView, BookingResponse, CalendarProjection, Service, ServiceStatus};
use crate::services::{availability, booking, calendar, catalog};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ServiceResponse {
    id: String,
    user_id: String,
    title: String,
    description: String,
    category: String,
    price: f64,
    availability: serde_json::Value,
    status: ServiceStatus,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<Service> for ServiceResponse {
    fn from(s: Service) -> Self {
        // Rows written before validation may hold a declaration that no longer parses
        let availability = serde_json::from_str(&s.availability).unwrap_or(serde_json::Value::Null);
        ServiceResponse {
            id: s.id,
            user_id: s.user_id,
            title: s.title,
            description: s.description,
            category: s.category,
            price: s.price,
            availability,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

// GET /api/categories
pub async fn list_categories() -> Json<Vec<&'static str>> {
    Json(catalog::CATEGORIES.to_vec())
}

// POST /api/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<catalog::ServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), AppError> {
    let owner = actor_id(&headers)?;
    let service = {
        let db = state.db()?;
        catalog::create_service(&*db, &request, &owner)?
    };
    Ok((StatusCode::CREATED, Json(service.into())))
}

// GET /api/services/mine
pub async fn list_my_services(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let owner = actor_id(&headers)?;
    let services = {
        let db = state.db()?;
        catalog::list_my_services(&*db, &owner)?
    };
    Ok(Json(services.into_iter().map(ServiceResponse::from).collect()))
}

// GET /api/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceResponse>, AppError> {
    let service = {
        let db = state.db()?;
        catalog::get_service(&*db, &id)?
    };
    Ok(Json(service.into()))
}

// PUT /api/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<catalog::ServiceUpdate>,
) -> Result<Json<ServiceResponse>, AppError> {
    let actor = actor_id(&headers)?;
    let service = {
        let db = state.db()?;
        catalog::update_service(&*db, &id, &update, &actor)?
    };
    Ok(Json(service.into()))
}

// DELETE /api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let actor = actor_id(&headers)?;
    {
        let db = state.db()?;
        catalog::delete_service(&*db, &*db, &id, &actor)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

// PATCH /api/services/:id/status
pub async fn update_service_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = actor_id(&headers)?;
    let status = {
        let db = state.db()?;
        catalog::update_service_status(&*db, &id, &request.status, &actor)?
    };
    Ok(Json(serde_json::json!({ "id": id, "status": status.as_str() })))
}

// GET /api/services/:id/availability?date=YYYY-MM-DD
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<AvailabilityView>, AppError> {
    let date = query
        .get("date")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Date parameter is required (format: YYYY-MM-DD)".to_string())
        })?;

    let view = {
        let db = state.db()?;
        availability::get_availability(&*db, &*db, &id, date, state.today())?
    };
    Ok(Json(view))
}

// GET /api/services/:id/calendar
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CalendarProjection>, AppError> {
    let projection = {
        let db = state.db()?;
        calendar::get_calendar(&*db, &*db, &id, state.today())?
    };
    Ok(Json(projection))
}

// GET /api/services/:id/bookings
pub async fn list_service_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let actor = actor_id(&headers)?;
    let bookings = {
        let db = state.db()?;
        let found = booking::list_service_bookings(&*db, &*db, &id, &actor)?;
        booking::with_services(&*db, found)
    };
    Ok(Json(bookings))
}
