// db/taskerdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use super::userdb::TASKER_PROFILE_COLUMNS;

use crate::dtos::taskerdtos::{
    CreateServiceDto, PendingVerificationDto, SearchServicesDto, UpdateServiceDto,
};
use crate::models::taskermodel::*;

const SERVICE_COLUMNS: &str = r#"
    id, tasker_id, category, title, description, pricing_type, price, city,
    is_active, created_at, updated_at
"#;

#[async_trait]
pub trait TaskerExt {
    async fn get_tasker_profile(&self, user_id: Uuid) -> Result<Option<TaskerProfile>, sqlx::Error>;

    async fn update_tasker_profile(
        &self,
        user_id: Uuid,
        bio: Option<String>,
        experience_years: Option<i32>,
        service_cities: Option<Vec<String>>,
    ) -> Result<TaskerProfile, sqlx::Error>;

    async fn set_availability(&self, user_id: Uuid, is_available: bool) -> Result<TaskerProfile, sqlx::Error>;

    /// Stores the document path and queues the tasker for review.
    async fn submit_id_document(&self, user_id: Uuid, path: &str) -> Result<TaskerProfile, sqlx::Error>;

    /// `None` when the tasker already has `max_active` active services.
    async fn create_service(
        &self,
        tasker_id: Uuid,
        dto: CreateServiceDto,
        max_active: i64,
    ) -> Result<Option<TaskerService>, sqlx::Error>;

    async fn get_service(&self, service_id: Uuid) -> Result<Option<TaskerService>, sqlx::Error>;

    async fn update_service(
        &self,
        tasker_id: Uuid,
        service_id: Uuid,
        dto: UpdateServiceDto,
    ) -> Result<Option<TaskerService>, sqlx::Error>;

    async fn deactivate_service(&self, tasker_id: Uuid, service_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn get_tasker_services(
        &self,
        tasker_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<TaskerService>, sqlx::Error>;

    async fn search_services(
        &self,
        filters: &SearchServicesDto,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ServiceListing>, i64), sqlx::Error>;

    async fn get_pending_verifications(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Vec<PendingVerificationDto>, sqlx::Error>;

    /// Only pending verifications can be reviewed.
    async fn review_verification(
        &self,
        user_id: Uuid,
        approved: bool,
        note: Option<String>,
    ) -> Result<Option<TaskerProfile>, sqlx::Error>;
}

#[async_trait]
impl TaskerExt for DBClient {
    async fn get_tasker_profile(&self, user_id: Uuid) -> Result<Option<TaskerProfile>, sqlx::Error> {
        sqlx::query_as::<_, TaskerProfile>(&format!(
            "SELECT {} FROM tasker_profiles WHERE user_id = $1",
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_tasker_profile(
        &self,
        user_id: Uuid,
        bio: Option<String>,
        experience_years: Option<i32>,
        service_cities: Option<Vec<String>>,
    ) -> Result<TaskerProfile, sqlx::Error> {
        sqlx::query_as::<_, TaskerProfile>(&format!(
            r#"
            UPDATE tasker_profiles
            SET bio = COALESCE($2, bio),
                experience_years = COALESCE($3, experience_years),
                service_cities = COALESCE($4, service_cities),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(bio)
        .bind(experience_years)
        .bind(service_cities)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_availability(&self, user_id: Uuid, is_available: bool) -> Result<TaskerProfile, sqlx::Error> {
        sqlx::query_as::<_, TaskerProfile>(&format!(
            "UPDATE tasker_profiles SET is_available = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {}",
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(is_available)
        .fetch_one(&self.pool)
        .await
    }

    async fn submit_id_document(&self, user_id: Uuid, path: &str) -> Result<TaskerProfile, sqlx::Error> {
        sqlx::query_as::<_, TaskerProfile>(&format!(
            r#"
            UPDATE tasker_profiles
            SET id_document_path = $2,
                verification_status = 'pending',
                verification_note = NULL,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(path)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_service(
        &self,
        tasker_id: Uuid,
        dto: CreateServiceDto,
        max_active: i64,
    ) -> Result<Option<TaskerService>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Serialises concurrent creations for the same tasker.
        sqlx::query("SELECT user_id FROM tasker_profiles WHERE user_id = $1 FOR UPDATE")
            .bind(tasker_id)
            .fetch_one(&mut *tx)
            .await?;

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasker_services WHERE tasker_id = $1 AND is_active",
        )
        .bind(tasker_id)
        .fetch_one(&mut *tx)
        .await?;

        if active >= max_active {
            tx.rollback().await?;
            return Ok(None);
        }

        let service = sqlx::query_as::<_, TaskerService>(&format!(
            r#"
            INSERT INTO tasker_services (tasker_id, category, title, description, pricing_type, price, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(tasker_id)
        .bind(dto.category)
        .bind(dto.title)
        .bind(dto.description)
        .bind(dto.pricing_type)
        .bind(dto.price)
        .bind(dto.city)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(service))
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Option<TaskerService>, sqlx::Error> {
        sqlx::query_as::<_, TaskerService>(&format!(
            "SELECT {} FROM tasker_services WHERE id = $1",
            SERVICE_COLUMNS
        ))
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_service(
        &self,
        tasker_id: Uuid,
        service_id: Uuid,
        dto: UpdateServiceDto,
    ) -> Result<Option<TaskerService>, sqlx::Error> {
        sqlx::query_as::<_, TaskerService>(&format!(
            r#"
            UPDATE tasker_services
            SET category = COALESCE($3, category),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                pricing_type = COALESCE($6, pricing_type),
                price = COALESCE($7, price),
                city = COALESCE($8, city),
                updated_at = NOW()
            WHERE id = $1 AND tasker_id = $2 AND is_active
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(service_id)
        .bind(tasker_id)
        .bind(dto.category)
        .bind(dto.title)
        .bind(dto.description)
        .bind(dto.pricing_type)
        .bind(dto.price)
        .bind(dto.city)
        .fetch_optional(&self.pool)
        .await
    }

    async fn deactivate_service(&self, tasker_id: Uuid, service_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasker_services SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND tasker_id = $2 AND is_active
            "#,
        )
        .bind(service_id)
        .bind(tasker_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_tasker_services(
        &self,
        tasker_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<TaskerService>, sqlx::Error> {
        sqlx::query_as::<_, TaskerService>(&format!(
            r#"
            SELECT {} FROM tasker_services
            WHERE tasker_id = $1 AND (is_active OR NOT $2)
            ORDER BY created_at DESC
            "#,
            SERVICE_COLUMNS
        ))
        .bind(tasker_id)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await
    }

    async fn search_services(
        &self,
        filters: &SearchServicesDto,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ServiceListing>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let where_clause = r#"
            WHERE s.is_active
              AND tp.is_available
              AND u.is_suspended = false
              AND ($1::service_category IS NULL OR s.category = $1)
              AND ($2::text IS NULL OR LOWER(s.city) = LOWER($2))
              AND ($3::bigint IS NULL OR s.price >= $3)
              AND ($4::bigint IS NULL OR s.price <= $4)
        "#;

        let listings = sqlx::query_as::<_, ServiceListing>(&format!(
            r#"
            SELECT s.id, s.tasker_id, u.name AS tasker_name, u.avatar_path AS tasker_avatar_path,
                   tp.rating_average, tp.rating_count,
                   s.category, s.title, s.description, s.pricing_type, s.price, s.city, s.created_at
            FROM tasker_services s
            JOIN tasker_profiles tp ON tp.user_id = s.tasker_id
            JOIN users u ON u.id = s.tasker_id
            {}
            ORDER BY tp.rating_average DESC, s.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            where_clause
        ))
        .bind(filters.category)
        .bind(&filters.city)
        .bind(filters.min_price)
        .bind(filters.max_price)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM tasker_services s
            JOIN tasker_profiles tp ON tp.user_id = s.tasker_id
            JOIN users u ON u.id = s.tasker_id
            {}
            "#,
            where_clause
        ))
        .bind(filters.category)
        .bind(&filters.city)
        .bind(filters.min_price)
        .bind(filters.max_price)
        .fetch_one(&self.pool)
        .await?;

        Ok((listings, total))
    }

    async fn get_pending_verifications(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<Vec<PendingVerificationDto>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, PendingVerificationDto>(
            r#"
            SELECT tp.user_id, u.name, u.email, tp.id_document_path,
                   tp.experience_years, tp.service_cities, tp.updated_at
            FROM tasker_profiles tp
            JOIN users u ON u.id = tp.user_id
            WHERE tp.verification_status = 'pending'
            ORDER BY tp.updated_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn review_verification(
        &self,
        user_id: Uuid,
        approved: bool,
        note: Option<String>,
    ) -> Result<Option<TaskerProfile>, sqlx::Error> {
        let status = if approved {
            TaskerVerificationStatus::Approved
        } else {
            TaskerVerificationStatus::Rejected
        };

        sqlx::query_as::<_, TaskerProfile>(&format!(
            r#"
            UPDATE tasker_profiles
            SET verification_status = $2, verification_note = $3, updated_at = NOW()
            WHERE user_id = $1 AND verification_status = 'pending'
            RETURNING {}
            "#,
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(status)
        .bind(note)
        .fetch_optional(&self.pool)
        .await
    }
}
