use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A provider's bookable offering. `availability` is the stored JSON
/// declaration, read back through `resolve_day_rule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub availability: String,
    pub status: ServiceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub availability: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ServiceStatus::Active),
            "inactive" => Some(ServiceStatus::Inactive),
            _ => None,
        }
    }
}
