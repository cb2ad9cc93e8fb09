use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    reviewmodel::ReviewWithAuthor,
    taskermodel::*,
};

use super::userdtos::PublicUserDto;

pub const MAX_ACTIVE_SERVICES: i64 = 20;

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateTaskerProfileDto {
    #[validate(length(min = 10, max = 1000, message = "Bio must be between 10 and 1000 characters"))]
    pub bio: Option<String>,

    #[validate(range(min = 0, max = 60, message = "Experience must be between 0 and 60 years"))]
    pub experience_years: Option<i32>,

    #[validate(length(min = 1, max = 10, message = "Provide between 1 and 10 service cities"))]
    pub service_cities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateAvailabilityDto {
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateServiceDto {
    pub category: ServiceCategory,

    #[validate(length(min = 3, max = 120, message = "Title must be between 3 and 120 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 2000, message = "Description must be between 10 and 2000 characters"))]
    pub description: String,

    pub pricing_type: PricingType,

    #[validate(range(min = 1, max = 10_000_000, message = "Price must be between 1 and 10,000,000 centimes"))]
    pub price: i64,

    #[validate(length(min = 2, max = 100, message = "City must be between 2 and 100 characters"))]
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateServiceDto {
    pub category: Option<ServiceCategory>,

    #[validate(length(min = 3, max = 120, message = "Title must be between 3 and 120 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, max = 2000, message = "Description must be between 10 and 2000 characters"))]
    pub description: Option<String>,

    pub pricing_type: Option<PricingType>,

    #[validate(range(min = 1, max = 10_000_000, message = "Price must be between 1 and 10,000,000 centimes"))]
    pub price: Option<i64>,

    #[validate(length(min = 2, max = 100, message = "City must be between 2 and 100 characters"))]
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct SearchServicesDto {
    pub category: Option<ServiceCategory>,
    pub city: Option<String>,
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskerPublicProfileDto {
    pub user: PublicUserDto,
    pub profile: TaskerProfile,
    pub services: Vec<TaskerService>,
    pub latest_reviews: Vec<ReviewWithAuthor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerificationReviewDto {
    pub approved: bool,
    pub note: Option<String>,
}

/// Row for the admin verification queue.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingVerificationDto {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub id_document_path: Option<String>,
    pub experience_years: i32,
    pub service_cities: Vec<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> CreateServiceDto {
        CreateServiceDto {
            category: ServiceCategory::Plumbing,
            title: "Leak repair".to_string(),
            description: "Fix leaking pipes and taps".to_string(),
            pricing_type: PricingType::Hourly,
            price: 15_000,
            city: "Rabat".to_string(),
        }
    }

    #[test]
    fn service_bounds() {
        assert!(create().validate().is_ok());

        let mut dto = create();
        dto.price = 0;
        assert!(dto.validate().is_err());

        let mut dto = create();
        dto.price = 10_000_001;
        assert!(dto.validate().is_err());

        let mut dto = create();
        dto.title = "ab".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn search_query_deserializes_snake_case_category() {
        let dto: SearchServicesDto =
            serde_json::from_value(serde_json::json!({"category": "furniture_assembly", "limit": 5})).unwrap();
        assert_eq!(dto.category, Some(ServiceCategory::FurnitureAssembly));
        assert!(dto.validate().is_ok());
    }
}
