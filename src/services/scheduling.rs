use chrono::{Datelike, Local, NaiveDate};

use crate::db::ServiceStore;
use crate::errors::AppError;
use crate::models::availability::{resolve_day_rule, weekday_name};
use crate::models::{Service, ServiceStatus, Slot, WeekdayRule};
use crate::services::slots::{generate_slots, SlotError};

/// Server-local calendar date. Callers take it once per request and pass it down.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    if s.len() != 10 {
        return Err(AppError::BadRequest(
            "Invalid date format. Use YYYY-MM-DD".to_string(),
        ));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string()))
}

pub fn ensure_not_past(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date < today {
        return Err(AppError::BadRequest(format!(
            "Date {date} is in the past"
        )));
    }
    Ok(())
}

pub fn load_service(services: &dyn ServiceStore, id: &str) -> Result<Service, AppError> {
    services
        .get_service(id)
        .map_err(|e| AppError::internal("Failed to get service", e))?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))
}

pub fn load_active_service(services: &dyn ServiceStore, id: &str) -> Result<Service, AppError> {
    let service = load_service(services, id)?;
    if service.status != ServiceStatus::Active {
        return Err(AppError::BadRequest("Service is not active".to_string()));
    }
    Ok(service)
}

pub fn rule_for(service: &Service, date: NaiveDate) -> WeekdayRule {
    resolve_day_rule(&service.availability, date.weekday())
}

/// Slots offered on `date` for read-only views. Closed days and stored
/// ranges that cannot produce slots both come back empty.
pub fn offered_slots(service: &Service, date: NaiveDate) -> Vec<Slot> {
    match rule_for(service, date) {
        WeekdayRule::Closed => Vec::new(),
        WeekdayRule::Open { start, end } => match generate_slots(start, end) {
            Ok(slots) => slots,
            Err(SlotError::InvalidRange { start, end }) => {
                tracing::warn!(
                    service_id = %service.id,
                    weekday = weekday_name(date.weekday()),
                    %start,
                    %end,
                    "stored hours have an empty range; treating day as closed"
                );
                Vec::new()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2030-06-17").unwrap(), NaiveDate::from_ymd_opt(2030, 6, 17).unwrap());
        for bad in ["2030-6-17", "17-06-2030", "2030-02-30", "2030-06-17T00:00", "", "tomorrow"] {
            assert!(matches!(parse_date(bad), Err(AppError::BadRequest(_))), "{bad}");
        }
    }

    #[test]
    fn test_today_is_not_past() {
        let today = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap();
        assert!(ensure_not_past(today, today).is_ok());
        assert!(ensure_not_past(today.succ_opt().unwrap(), today).is_ok());
        assert!(matches!(
            ensure_not_past(today.pred_opt().unwrap(), today),
            Err(AppError::BadRequest(_))
        ));
    }
}
