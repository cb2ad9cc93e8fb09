use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::taskermodel::ServiceCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Assigned => "assigned",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobActor {
    Owner,
    AssignedTasker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTransitionError {
    Invalid { from: JobStatus, to: JobStatus },
    NotAllowed { to: JobStatus },
}

impl std::fmt::Display for JobTransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobTransitionError::Invalid { from, to } => {
                write!(f, "Job cannot move from {} to {}", from.to_str(), to.to_str())
            }
            JobTransitionError::NotAllowed { to } => write!(f, "You cannot move this job to {}", to.to_str()),
        }
    }
}

/// Status changes reachable through the job status endpoint. Assignment
/// goes through application acceptance instead.
pub fn check_job_transition(from: JobStatus, to: JobStatus, actor: JobActor) -> Result<(), JobTransitionError> {
    let allowed = match (from, to) {
        (JobStatus::Assigned, JobStatus::InProgress) => actor == JobActor::AssignedTasker,
        (JobStatus::InProgress, JobStatus::Completed) => actor == JobActor::Owner,
        (JobStatus::Active, JobStatus::Cancelled) | (JobStatus::Assigned, JobStatus::Cancelled) => {
            actor == JobActor::Owner
        }
        _ => return Err(JobTransitionError::Invalid { from, to }),
    };

    if allowed {
        Ok(())
    } else {
        Err(JobTransitionError::NotAllowed { to })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub category: ServiceCategory,
    pub title: String,
    pub description: String,
    pub city: String,
    pub address_id: Option<Uuid>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub assigned_tasker_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn actor_for(&self, user_id: Uuid) -> Option<JobActor> {
        if user_id == self.customer_id {
            Some(JobActor::Owner)
        } else if Some(user_id) == self.assigned_tasker_id {
            Some(JobActor::AssignedTasker)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub job_id: Uuid,
    pub tasker_id: Uuid,
    pub proposed_price: i64,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasker_starts_and_customer_completes() {
        assert!(check_job_transition(JobStatus::Assigned, JobStatus::InProgress, JobActor::AssignedTasker).is_ok());
        assert!(check_job_transition(JobStatus::Assigned, JobStatus::InProgress, JobActor::Owner).is_err());
        assert!(check_job_transition(JobStatus::InProgress, JobStatus::Completed, JobActor::Owner).is_ok());
        assert!(check_job_transition(JobStatus::InProgress, JobStatus::Completed, JobActor::AssignedTasker).is_err());
    }

    #[test]
    fn only_owner_cancels_before_work_starts() {
        assert!(check_job_transition(JobStatus::Active, JobStatus::Cancelled, JobActor::Owner).is_ok());
        assert!(check_job_transition(JobStatus::Assigned, JobStatus::Cancelled, JobActor::Owner).is_ok());
        assert_eq!(
            check_job_transition(JobStatus::Assigned, JobStatus::Cancelled, JobActor::AssignedTasker),
            Err(JobTransitionError::NotAllowed { to: JobStatus::Cancelled })
        );
        assert!(check_job_transition(JobStatus::InProgress, JobStatus::Cancelled, JobActor::Owner).is_err());
    }

    #[test]
    fn assignment_is_not_a_status_edit() {
        assert_eq!(
            check_job_transition(JobStatus::Active, JobStatus::Assigned, JobActor::Owner),
            Err(JobTransitionError::Invalid { from: JobStatus::Active, to: JobStatus::Assigned })
        );
        assert!(check_job_transition(JobStatus::Completed, JobStatus::Active, JobActor::Owner).is_err());
    }
}
