// service/job_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        addressdb::AddressExt,
        chatdb::ChatExt,
        db::DBClient,
        jobdb::{AcceptOutcome, JobExt},
    },
    dtos::jobdtos::{AcceptApplicationResponseDto, CreateApplicationDto, CreateJobDto},
    models::{
        jobmodel::*,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService},
    utils::sanitize::plain_text,
};

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn accepted(outcome: AcceptOutcome) -> Result<(Job, JobApplication), ServiceError> {
    match outcome {
        AcceptOutcome::Accepted { job, application } => Ok((job, application)),
        AcceptOutcome::ApplicationNotPending => Err(ServiceError::Conflict("Application is not pending".to_string())),
        AcceptOutcome::JobNotActive => Err(ServiceError::Conflict("Job is no longer active".to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl JobService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    async fn load_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.db_client
            .get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Job not found".to_string()))
    }

    pub async fn create_job(&self, customer: &User, dto: CreateJobDto) -> Result<Job, ServiceError> {
        if customer.role != UserRole::Customer {
            return Err(ServiceError::Forbidden("Only customers can post jobs".to_string()));
        }

        if !dto.preferred_date_is_future(Utc::now()) {
            return Err(ServiceError::Validation("Preferred date cannot be in the past".to_string()));
        }

        if let Some(address_id) = dto.address_id {
            let owned = self
                .db_client
                .get_address(address_id)
                .await?
                .map(|address| address.is_owned_by(customer.id))
                .unwrap_or(false);
            if !owned {
                return Err(ServiceError::NotFound("Address not found".to_string()));
            }
        }

        let job = self.db_client.create_job(customer.id, dto).await?;
        tracing::info!("Job {} posted by {} in {}", job.id, customer.id, job.city);
        Ok(job)
    }

    pub async fn apply(
        &self,
        tasker: &User,
        job_id: Uuid,
        dto: CreateApplicationDto,
    ) -> Result<JobApplication, ServiceError> {
        if tasker.role != UserRole::Tasker {
            return Err(ServiceError::Forbidden("Only taskers can apply to jobs".to_string()));
        }

        let job = self.load_job(job_id).await?;
        if job.customer_id == tasker.id {
            return Err(ServiceError::Validation("You cannot apply to your own job".to_string()));
        }
        if job.status != JobStatus::Active {
            return Err(ServiceError::Validation("This job is no longer accepting applications".to_string()));
        }

        let application = self
            .db_client
            .create_application(job.id, tasker.id, dto.proposed_price, plain_text(&dto.message))
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::Conflict("You have already applied to this job".to_string())
                } else {
                    ServiceError::Database(e)
                }
            })?;

        self.notification_service
            .notify_job_application(&job, &application)
            .await;

        Ok(application)
    }

    /// Accepts one application and assigns the job. Other pending
    /// applications are rejected.
    pub async fn accept_application(
        &self,
        owner: &User,
        job_id: Uuid,
        application_id: Uuid,
    ) -> Result<AcceptApplicationResponseDto, ServiceError> {
        let job = self.load_job(job_id).await?;
        if job.customer_id != owner.id {
            return Err(ServiceError::Forbidden("Only the job owner can accept applications".to_string()));
        }

        let outcome = self.db_client.accept_application(job_id, application_id).await?;
        let (job, application) = accepted(outcome)?;

        tracing::info!("Application {} accepted for job {}", application.id, job.id);

        let conversation_id = match self
            .db_client
            .get_or_create_conversation(job.customer_id, application.tasker_id, Some(job.id), None)
            .await
        {
            Ok(conversation) => Some(conversation.id),
            Err(e) => {
                tracing::error!("Failed to open conversation for job {}: {}", job.id, e);
                None
            }
        };

        self.notification_service
            .notify_application_accepted(&job, &application, conversation_id)
            .await;

        Ok(AcceptApplicationResponseDto {
            job,
            application,
            conversation_id,
        })
    }

    pub async fn withdraw_application(
        &self,
        tasker: &User,
        job_id: Uuid,
        application_id: Uuid,
    ) -> Result<JobApplication, ServiceError> {
        let application = self
            .db_client
            .get_application(application_id)
            .await?
            .filter(|application| application.job_id == job_id)
            .ok_or_else(|| ServiceError::NotFound("Application not found".to_string()))?;

        if application.tasker_id != tasker.id {
            return Err(ServiceError::Forbidden("You can only withdraw your own application".to_string()));
        }

        self.db_client
            .withdraw_application(application_id, tasker.id)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Only pending applications can be withdrawn".to_string()))
    }

    pub async fn update_status(&self, user: &User, job_id: Uuid, to: JobStatus) -> Result<Job, ServiceError> {
        let job = self.load_job(job_id).await?;
        let actor = job
            .actor_for(user.id)
            .ok_or_else(|| ServiceError::Forbidden("You are not part of this job".to_string()))?;

        check_job_transition(job.status, to, actor).map_err(|e| match e {
            JobTransitionError::Invalid { .. } => ServiceError::Validation(e.to_string()),
            JobTransitionError::NotAllowed { .. } => ServiceError::Forbidden(e.to_string()),
        })?;

        let updated = self
            .db_client
            .update_job_status(job.id, job.status, to)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Job was changed by someone else, reload and retry".to_string()))?;

        tracing::info!("Job {} moved {} -> {}", job.id, job.status.to_str(), to.to_str());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use axum::http::StatusCode;

    #[test]
    fn lost_accept_races_are_conflicts() {
        for outcome in [AcceptOutcome::ApplicationNotPending, AcceptOutcome::JobNotActive] {
            let err = accepted(outcome).unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(_)));
            let http: HttpError = err.into();
            assert_eq!(http.status, StatusCode::CONFLICT);
        }
    }
}
