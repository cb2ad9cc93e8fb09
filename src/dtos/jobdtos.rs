use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{jobmodel::*, taskermodel::ServiceCategory};

fn validate_budget_range(dto: &CreateJobDto) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (dto.budget_min, dto.budget_max) {
        if min > max {
            let mut error = ValidationError::new("invalid_budget");
            error.message = Some("Minimum budget cannot exceed maximum budget".into());
            return Err(error);
        }
    }
    Ok(())
}

//Job Dto
#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_budget_range"))]
pub struct CreateJobDto {
    pub category: ServiceCategory,

    #[validate(length(min = 5, max = 120, message = "Title must be between 5 and 120 characters"))]
    pub title: String,

    #[validate(length(min = 20, max = 4000, message = "Description must be between 20 and 4000 characters"))]
    pub description: String,

    #[validate(length(min = 2, max = 100, message = "City is required"))]
    pub city: String,

    pub address_id: Option<Uuid>,

    #[validate(range(min = 1, message = "Budget must be positive"))]
    pub budget_min: Option<i64>,

    #[validate(range(min = 1, message = "Budget must be positive"))]
    pub budget_max: Option<i64>,

    pub preferred_date: Option<DateTime<Utc>>,
}

impl CreateJobDto {
    pub fn preferred_date_is_future(&self, now: DateTime<Utc>) -> bool {
        self.preferred_date.map(|date| date >= now).unwrap_or(true)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct SearchJobsDto {
    pub category: Option<ServiceCategory>,
    pub city: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateApplicationDto {
    #[validate(range(min = 1, max = 10_000_000, message = "Proposed price must be between 1 and 10,000,000 centimes"))]
    pub proposed_price: i64,

    #[validate(length(min = 10, max = 2000, message = "Message must be between 10 and 2000 characters"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateJobStatusDto {
    pub status: JobStatus,
}

/// Application with the applicant's public details, for the job owner.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationWithTaskerDto {
    pub id: Uuid,
    pub job_id: Uuid,
    pub tasker_id: Uuid,
    pub tasker_name: String,
    pub tasker_avatar_path: Option<String>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub proposed_price: i64,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptApplicationResponseDto {
    pub job: Job,
    pub application: JobApplication,
    pub conversation_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> CreateJobDto {
        CreateJobDto {
            category: ServiceCategory::Painting,
            title: "Paint my living room".to_string(),
            description: "Two walls need a fresh coat of white paint".to_string(),
            city: "Marrakesh".to_string(),
            address_id: None,
            budget_min: Some(50_000),
            budget_max: Some(80_000),
            preferred_date: None,
        }
    }

    #[test]
    fn budget_range_must_be_ordered() {
        assert!(create().validate().is_ok());

        let mut dto = create();
        dto.budget_min = Some(90_000);
        assert!(dto.validate().is_err());

        let mut dto = create();
        dto.budget_max = None;
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn preferred_date_in_past_is_flagged() {
        let now = Utc::now();
        let mut dto = create();
        assert!(dto.preferred_date_is_future(now));
        dto.preferred_date = Some(now - chrono::Duration::days(1));
        assert!(!dto.preferred_date_is_future(now));
        dto.preferred_date = Some(now + chrono::Duration::days(1));
        assert!(dto.preferred_date_is_future(now));
    }

    #[test]
    fn short_title_rejected() {
        let mut dto = create();
        dto.title = "Fix".to_string();
        assert!(dto.validate().is_err());
    }
}
