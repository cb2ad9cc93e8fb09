use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "service_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Cleaning,
    Plumbing,
    Electrical,
    Painting,
    Moving,
    Handyman,
    Gardening,
    FurnitureAssembly,
    ApplianceRepair,
    Delivery,
    Babysitting,
    ElderlyCare,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "tasker_verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskerVerificationStatus {
    Unverified,
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "pricing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Fixed,
    Hourly,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TaskerProfile {
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub experience_years: i32,
    pub service_cities: Vec<String>,
    pub verification_status: TaskerVerificationStatus,
    #[serde(skip_serializing)]
    pub id_document_path: Option<String>,
    pub verification_note: Option<String>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub completed_bookings: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TaskerService {
    pub id: Uuid,
    pub tasker_id: Uuid,
    pub category: ServiceCategory,
    pub title: String,
    pub description: String,
    pub pricing_type: PricingType,
    pub price: i64, // in centimes
    pub city: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskerService {
    /// Amount due for a booking of this service. Hourly services need a
    /// duration, fixed ones must not carry one.
    pub fn quote(&self, hours: Option<i32>) -> Result<i64, String> {
        match (self.pricing_type, hours) {
            (PricingType::Fixed, None) => Ok(self.price),
            (PricingType::Fixed, Some(_)) => Err("Hours are not accepted for fixed-price services".to_string()),
            (PricingType::Hourly, Some(h)) if (1..=12).contains(&h) => Ok(self.price * h as i64),
            (PricingType::Hourly, Some(_)) => Err("Hours must be between 1 and 12".to_string()),
            (PricingType::Hourly, None) => Err("Hours are required for hourly services".to_string()),
        }
    }
}

/// Search result row: a service joined with its tasker's public data.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ServiceListing {
    pub id: Uuid,
    pub tasker_id: Uuid,
    pub tasker_name: String,
    pub tasker_avatar_path: Option<String>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub category: ServiceCategory,
    pub title: String,
    pub description: String,
    pub pricing_type: PricingType,
    pub price: i64,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(pricing_type: PricingType, price: i64) -> TaskerService {
        TaskerService {
            id: Uuid::new_v4(),
            tasker_id: Uuid::new_v4(),
            category: ServiceCategory::Cleaning,
            title: "Deep clean".to_string(),
            description: "Full apartment deep clean".to_string(),
            pricing_type,
            price,
            city: "Casablanca".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fixed_price_ignores_duration() {
        let svc = service(PricingType::Fixed, 25_000);
        assert_eq!(svc.quote(None), Ok(25_000));
        assert!(svc.quote(Some(2)).is_err());
    }

    #[test]
    fn hourly_price_multiplies() {
        let svc = service(PricingType::Hourly, 8_000);
        assert_eq!(svc.quote(Some(3)), Ok(24_000));
        assert!(svc.quote(None).is_err());
        assert!(svc.quote(Some(0)).is_err());
        assert!(svc.quote(Some(13)).is_err());
    }
}
