// db/jobdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::dtos::jobdtos::{ApplicationWithTaskerDto, CreateJobDto, SearchJobsDto};
use crate::models::jobmodel::*;

const JOB_COLUMNS: &str = r#"
    id, customer_id, category, title, description, city, address_id,
    budget_min, budget_max, preferred_date, status, assigned_tasker_id,
    created_at, updated_at
"#;

const APPLICATION_COLUMNS: &str =
    "id, job_id, tasker_id, proposed_price, message, status, created_at, updated_at";

#[derive(Debug)]
pub enum AcceptOutcome {
    Accepted { job: Job, application: JobApplication },
    ApplicationNotPending,
    JobNotActive,
}

#[async_trait]
pub trait JobExt {
    async fn create_job(&self, customer_id: Uuid, dto: CreateJobDto) -> Result<Job, sqlx::Error>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error>;

    async fn get_active_jobs(
        &self,
        filters: &SearchJobsDto,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Job>, i64), sqlx::Error>;

    async fn get_customer_jobs(
        &self,
        customer_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Job>, i64), sqlx::Error>;

    /// Guarded on the current status so concurrent changes do not overwrite each other.
    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error>;

    async fn create_application(
        &self,
        job_id: Uuid,
        tasker_id: Uuid,
        proposed_price: i64,
        message: String,
    ) -> Result<JobApplication, sqlx::Error>;

    async fn get_application(&self, application_id: Uuid) -> Result<Option<JobApplication>, sqlx::Error>;

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<ApplicationWithTaskerDto>, sqlx::Error>;

    async fn get_tasker_applications(
        &self,
        tasker_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<JobApplication>, i64), sqlx::Error>;

    async fn withdraw_application(
        &self,
        application_id: Uuid,
        tasker_id: Uuid,
    ) -> Result<Option<JobApplication>, sqlx::Error>;

    /// Accepts `application_id` and assigns its tasker to the job. The other
    /// pending applications are rejected in the same transaction.
    async fn accept_application(&self, job_id: Uuid, application_id: Uuid) -> Result<AcceptOutcome, sqlx::Error>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, customer_id: Uuid, dto: CreateJobDto) -> Result<Job, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (customer_id, category, title, description, city, address_id,
                              budget_min, budget_max, preferred_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(customer_id)
        .bind(dto.category)
        .bind(dto.title)
        .bind(dto.description)
        .bind(dto.city)
        .bind(dto.address_id)
        .bind(dto.budget_min)
        .bind(dto.budget_max)
        .bind(dto.preferred_date)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_active_jobs(
        &self,
        filters: &SearchJobsDto,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Job>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let jobs = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE status = 'active'
              AND ($1::service_category IS NULL OR category = $1)
              AND ($2::text IS NULL OR LOWER(city) = LOWER($2))
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            JOB_COLUMNS
        ))
        .bind(filters.category)
        .bind(&filters.city)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM jobs
            WHERE status = 'active'
              AND ($1::service_category IS NULL OR category = $1)
              AND ($2::text IS NULL OR LOWER(city) = LOWER($2))
            "#,
        )
        .bind(filters.category)
        .bind(&filters.city)
        .fetch_one(&self.pool)
        .await?;

        Ok((jobs, total))
    }

    async fn get_customer_jobs(
        &self,
        customer_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Job>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let jobs = sqlx::query_as::<_, Job>(&format!(
            "SELECT {} FROM jobs WHERE customer_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            JOB_COLUMNS
        ))
        .bind(customer_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((jobs, total))
    }

    async fn update_job_status(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_application(
        &self,
        job_id: Uuid,
        tasker_id: Uuid,
        proposed_price: i64,
        message: String,
    ) -> Result<JobApplication, sqlx::Error> {
        sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            INSERT INTO job_applications (job_id, tasker_id, proposed_price, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .bind(tasker_id)
        .bind(proposed_price)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_application(&self, application_id: Uuid) -> Result<Option<JobApplication>, sqlx::Error> {
        sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {} FROM job_applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_job_applications(&self, job_id: Uuid) -> Result<Vec<ApplicationWithTaskerDto>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationWithTaskerDto>(
            r#"
            SELECT a.id, a.job_id, a.tasker_id, u.name AS tasker_name,
                   u.avatar_path AS tasker_avatar_path,
                   COALESCE(tp.rating_average, 0) AS rating_average,
                   COALESCE(tp.rating_count, 0) AS rating_count,
                   a.proposed_price, a.message, a.status, a.created_at
            FROM job_applications a
            JOIN users u ON u.id = a.tasker_id
            LEFT JOIN tasker_profiles tp ON tp.user_id = a.tasker_id
            WHERE a.job_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_tasker_applications(
        &self,
        tasker_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<JobApplication>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let applications = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            SELECT {} FROM job_applications
            WHERE tasker_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(tasker_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_applications WHERE tasker_id = $1")
            .bind(tasker_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((applications, total))
    }

    async fn withdraw_application(
        &self,
        application_id: Uuid,
        tasker_id: Uuid,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            UPDATE job_applications SET status = 'withdrawn', updated_at = NOW()
            WHERE id = $1 AND tasker_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .bind(tasker_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn accept_application(&self, job_id: Uuid, application_id: Uuid) -> Result<AcceptOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let application = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            UPDATE job_applications
            SET status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND job_id = $2 AND status = 'pending'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(application) = application else {
            tx.rollback().await?;
            return Ok(AcceptOutcome::ApplicationNotPending);
        };

        sqlx::query(
            r#"
            UPDATE job_applications
            SET status = 'rejected', updated_at = NOW()
            WHERE job_id = $1 AND id <> $2 AND status = 'pending'
            "#,
        )
        .bind(job_id)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'assigned', assigned_tasker_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(job_id)
        .bind(application.tasker_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job) = job else {
            tx.rollback().await?;
            return Ok(AcceptOutcome::JobNotActive);
        };

        tx.commit().await?;
        Ok(AcceptOutcome::Accepted { job, application })
    }
}
