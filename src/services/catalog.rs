use serde::Deserialize;

use crate::db::{BookingStore, ServiceStore};
use crate::errors::AppError;
use crate::models::{NewService, Service, ServiceStatus, WeeklyAvailability};
use crate::services::scheduling::load_service;

pub const CATEGORIES: &[&str] = &[
    "Limpieza",
    "Jardinería",
    "Plomería",
    "Electricidad",
    "Carpintería",
    "Pintura",
    "Mecánica",
    "Tecnología",
    "Educación",
    "Salud",
    "Belleza",
    "Mascotas",
    "Transporte",
    "Eventos",
    "Fotografía",
    "Cocina",
    "Fitness",
    "Música",
    "Idiomas",
    "Otros",
];

/// Canonical spelling of a category, matched case-insensitively.
pub fn normalize_category(category: &str) -> Option<&'static str> {
    let wanted = category.trim().to_lowercase();
    CATEGORIES.iter().copied().find(|c| c.to_lowercase() == wanted)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub availability: serde_json::Value,
}

/// Validates a new service and stores its availability in canonical form.
/// This is the only place a weekly declaration is parsed strictly.
pub fn create_service(
    services: &dyn ServiceStore,
    request: &ServiceRequest,
    owner_id: &str,
) -> Result<Service, AppError> {
    let title = request.title.trim();
    let description = request.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(AppError::BadRequest(
            "Title and description are required".to_string(),
        ));
    }
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(AppError::BadRequest("Price must be zero or more".to_string()));
    }
    let category = normalize_category(&request.category).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid category. Valid categories are: {}",
            CATEGORIES.join(", ")
        ))
    })?;
    let availability = WeeklyAvailability::from_value(&request.availability)
        .map_err(|e| AppError::BadRequest(format!("Invalid availability: {e}")))?;

    let service = services
        .create_service(&NewService {
            user_id: owner_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            price: request.price,
            availability: availability.to_value().to_string(),
        })
        .map_err(|e| AppError::internal("Failed to create service", e))?;

    tracing::info!(
        service_id = %service.id,
        owner_id,
        open_days = availability.open_days(),
        "service created"
    );
    Ok(service)
}

/// Fields a provider may change on an existing service. Absent fields keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub availability: Option<serde_json::Value>,
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

/// Applies an owner's edit. A new availability declaration goes through the
/// same strict parse as on creation and is stored in canonical form.
pub fn update_service(
    services: &dyn ServiceStore,
    id: &str,
    update: &ServiceUpdate,
    actor_id: &str,
) -> Result<Service, AppError> {
    let mut service = load_service(services, id)?;
    if service.user_id != actor_id {
        return Err(AppError::Unauthorized(
            "You don't have permission to update this service".to_string(),
        ));
    }

    if let Some(title) = &update.title {
        service.title = required_text("Title", title)?;
    }
    if let Some(description) = &update.description {
        service.description = required_text("Description", description)?;
    }
    if let Some(category) = &update.category {
        service.category = normalize_category(category)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid category. Valid categories are: {}",
                    CATEGORIES.join(", ")
                ))
            })?
            .to_string();
    }
    if let Some(price) = update.price {
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::BadRequest("Price must be zero or more".to_string()));
        }
        service.price = price;
    }
    if let Some(availability) = &update.availability {
        let availability = WeeklyAvailability::from_value(availability)
            .map_err(|e| AppError::BadRequest(format!("Invalid availability: {e}")))?;
        service.availability = availability.to_value().to_string();
    }

    let rows = services
        .update_service(&service)
        .map_err(|e| AppError::internal("Failed to update service", e))?;
    if rows == 0 {
        return Err(AppError::NotFound("Service not found".to_string()));
    }

    tracing::info!(service_id = id, "service updated");
    load_service(services, id)
}

/// Deletes an owner's service and its booking history. Refused while any
/// booking still holds a slot.
pub fn delete_service(
    services: &dyn ServiceStore,
    bookings: &dyn BookingStore,
    id: &str,
    actor_id: &str,
) -> Result<(), AppError> {
    let service = load_service(services, id)?;
    if service.user_id != actor_id {
        return Err(AppError::Unauthorized(
            "You don't have permission to delete this service".to_string(),
        ));
    }

    let active = bookings
        .count_active_bookings(&service.id)
        .map_err(|e| AppError::internal("Failed to count bookings", e))?;
    if active > 0 {
        return Err(AppError::Conflict(format!(
            "Service has {active} pending or accepted bookings"
        )));
    }

    let rows = services
        .delete_service(&service.id, actor_id)
        .map_err(|e| AppError::internal("Failed to delete service", e))?;
    if rows == 0 {
        return Err(AppError::NotFound(
            "Service not found or already deleted".to_string(),
        ));
    }

    tracing::info!(service_id = id, "service deleted");
    Ok(())
}

pub fn get_service(services: &dyn ServiceStore, id: &str) -> Result<Service, AppError> {
    load_service(services, id)
}

pub fn list_my_services(services: &dyn ServiceStore, owner_id: &str) -> Result<Vec<Service>, AppError> {
    services
        .services_for_user(owner_id)
        .map_err(|e| AppError::internal("Failed to get services", e))
}

pub fn update_service_status(
    services: &dyn ServiceStore,
    id: &str,
    status: &str,
    actor_id: &str,
) -> Result<ServiceStatus, AppError> {
    let status = ServiceStatus::parse(status).ok_or_else(|| {
        AppError::BadRequest("Invalid status. Allowed values: active, inactive".to_string())
    })?;

    let existing = load_service(services, id)?;
    if existing.user_id != actor_id {
        return Err(AppError::Unauthorized(
            "You don't have permission to update this service".to_string(),
        ));
    }
    if existing.status == status {
        return Err(AppError::BadRequest(format!(
            "Service is already {}",
            status.as_str()
        )));
    }

    let rows = services
        .set_service_status(id, status, actor_id)
        .map_err(|e| AppError::internal("Failed to update service status", e))?;
    if rows == 0 {
        return Err(AppError::NotFound("Service not found".to_string()));
    }

    tracing::info!(service_id = id, status = status.as_str(), "service status updated");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::availability::resolve_day_rule;
    use crate::models::{BookingStatus, NewBooking};
    use crate::services::fixtures::*;
    use chrono::Weekday;

    fn request(availability: serde_json::Value) -> ServiceRequest {
        ServiceRequest {
            title: " Dog walking ".to_string(),
            description: "Two walks a day".to_string(),
            category: "mascotas".to_string(),
            price: 15.5,
            availability,
        }
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("BELLEZA"), Some("Belleza"));
        assert_eq!(normalize_category("música"), Some("Música"));
        assert_eq!(normalize_category("Astrology"), None);
    }

    #[test]
    fn test_create_stores_canonical_availability() {
        let conn = setup_db();
        let availability = serde_json::json!({"Monday": {"start": "08:00", "end": "10:00"}});

        let service = create_service(&conn, &request(availability), PROVIDER).unwrap();
        assert_eq!(service.title, "Dog walking");
        assert_eq!(service.category, "Mascotas");
        assert_eq!(service.status, ServiceStatus::Active);

        let stored = get_service(&conn, &service.id).unwrap();
        let value: serde_json::Value = serde_json::from_str(&stored.availability).unwrap();
        assert_eq!(value["monday"]["available"], true);
        assert_eq!(value["sunday"]["available"], false);
        assert!(resolve_day_rule(&stored.availability, Weekday::Mon).is_available());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let conn = setup_db();
        let good = serde_json::json!({"monday": {"start": "08:00", "end": "10:00"}});

        let mut bad_category = request(good.clone());
        bad_category.category = "Astrology".to_string();
        let mut bad_price = request(good.clone());
        bad_price.price = -1.0;
        let mut blank_title = request(good);
        blank_title.title = "   ".to_string();
        let bad_hours = request(serde_json::json!({"monday": {"start": "10:00", "end": "08:00"}}));

        for req in [bad_category, bad_price, blank_title, bad_hours] {
            assert!(matches!(
                create_service(&conn, &req, PROVIDER),
                Err(AppError::BadRequest(_))
            ));
        }
        assert!(list_my_services(&conn, PROVIDER).unwrap().is_empty());
    }

    #[test]
    fn test_update_status_rules() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        assert!(matches!(
            update_service_status(&conn, &service.id, "archived", PROVIDER),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            update_service_status(&conn, "missing", "inactive", PROVIDER),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            update_service_status(&conn, &service.id, "inactive", CLIENT),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            update_service_status(&conn, &service.id, "active", PROVIDER),
            Err(AppError::BadRequest(_))
        ));

        assert_eq!(
            update_service_status(&conn, &service.id, "inactive", PROVIDER).unwrap(),
            ServiceStatus::Inactive
        );
        assert_eq!(list_my_services(&conn, PROVIDER).unwrap()[0].status, ServiceStatus::Inactive);
    }

    #[test]
    fn test_update_revalidates_availability() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let update = ServiceUpdate {
            title: Some("  Fade  ".to_string()),
            category: Some("LIMPIEZA".to_string()),
            availability: Some(serde_json::json!({"Sunday": {"start": "08:00", "end": "09:00"}})),
            ..Default::default()
        };
        let updated = update_service(&conn, &service.id, &update, PROVIDER).unwrap();
        assert_eq!(updated.title, "Fade");
        assert_eq!(updated.category, "Limpieza");
        assert_eq!(updated.description, service.description);
        assert_eq!(updated.price, service.price);

        let value: serde_json::Value = serde_json::from_str(&updated.availability).unwrap();
        assert_eq!(value["sunday"]["start"], "08:00");
        assert_eq!(value["monday"]["available"], false);
        assert!(resolve_day_rule(&updated.availability, Weekday::Sun).is_available());
    }

    #[test]
    fn test_update_rejects_bad_input_and_strangers() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);

        let bad = [
            ServiceUpdate {
                availability: Some(serde_json::json!({"monday": {"start": "12:00", "end": "09:00"}})),
                ..Default::default()
            },
            ServiceUpdate {
                category: Some("Astrology".to_string()),
                ..Default::default()
            },
            ServiceUpdate {
                price: Some(-3.0),
                ..Default::default()
            },
            ServiceUpdate {
                description: Some(" ".to_string()),
                ..Default::default()
            },
        ];
        for update in &bad {
            assert!(matches!(
                update_service(&conn, &service.id, update, PROVIDER),
                Err(AppError::BadRequest(_))
            ));
        }
        assert_eq!(get_service(&conn, &service.id).unwrap().availability, WEEKLY);

        assert!(matches!(
            update_service(&conn, &service.id, &ServiceUpdate::default(), CLIENT),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            update_service(&conn, "missing", &ServiceUpdate::default(), PROVIDER),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_rules() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        let booking = conn
            .create_booking(&NewBooking {
                service_id: service.id.clone(),
                client_id: CLIENT.to_string(),
                provider_id: PROVIDER.to_string(),
                date: today(),
                slot: "09:00-09:30".to_string(),
                notes: None,
            })
            .unwrap();

        assert!(matches!(
            delete_service(&conn, &conn, &service.id, CLIENT),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            delete_service(&conn, &conn, &service.id, PROVIDER),
            Err(AppError::Conflict(_))
        ));

        conn.set_booking_status(&booking.id, BookingStatus::Pending, BookingStatus::Cancelled, CLIENT)
            .unwrap();
        delete_service(&conn, &conn, &service.id, PROVIDER).unwrap();
        assert!(matches!(get_service(&conn, &service.id), Err(AppError::NotFound(_))));
        assert!(matches!(
            delete_service(&conn, &conn, &service.id, PROVIDER),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_store_failure_is_internal() {
        let conn = setup_db();
        let service = seed_service(&conn, WEEKLY);
        assert!(matches!(
            delete_service(&conn, &FailingStore, &service.id, PROVIDER),
            Err(AppError::Internal(_))
        ));
        assert!(get_service(&conn, &service.id).is_ok());
    }
}
