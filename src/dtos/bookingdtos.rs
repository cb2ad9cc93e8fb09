use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::bookingmodel::BookingStatus;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBookingDto {
    pub service_id: Uuid,

    pub scheduled_at: DateTime<Utc>,

    #[validate(range(min = 1, max = 12, message = "Hours must be between 1 and 12"))]
    pub hours: Option<i32>,

    pub address_id: Option<Uuid>,

    #[validate(length(max = 1000, message = "Notes must not exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingSide {
    Customer,
    Tasker,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct BookingQueryDto {
    #[serde(rename = "as")]
    pub side: Option<BookingSide>,
    pub status: Option<BookingStatus>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateBookingStatusDto {
    pub status: BookingStatus,

    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOutcome {
    Completed,
    Refunded,
}

impl DisputeOutcome {
    pub fn target_status(&self) -> BookingStatus {
        match self {
            DisputeOutcome::Completed => BookingStatus::Completed,
            DisputeOutcome::Refunded => BookingStatus::Refunded,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeDto {
    pub outcome: DisputeOutcome,

    #[validate(length(max = 500, message = "Note must not exceed 500 characters"))]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reads_as_parameter() {
        let dto: BookingQueryDto =
            serde_json::from_value(serde_json::json!({"as": "tasker", "status": "in_progress"})).unwrap();
        assert_eq!(dto.side, Some(BookingSide::Tasker));
        assert_eq!(dto.status, Some(BookingStatus::InProgress));
    }

    #[test]
    fn hours_out_of_range() {
        let dto = CreateBookingDto {
            service_id: Uuid::new_v4(),
            scheduled_at: Utc::now(),
            hours: Some(13),
            address_id: None,
            notes: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn dispute_outcomes_map_to_final_statuses() {
        assert_eq!(DisputeOutcome::Completed.target_status(), BookingStatus::Completed);
        assert_eq!(DisputeOutcome::Refunded.target_status(), BookingStatus::Refunded);
    }
}
