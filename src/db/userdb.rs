// db/userdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::{
    taskermodel::TaskerProfile,
    usermodel::{TokenPurpose, User, UserRole},
};
use crate::utils::locale::Locale;

pub(crate) const USER_COLUMNS: &str = r#"
    id, name, email, phone, password, role, locale, bio, avatar_path,
    verified, is_suspended, verification_token, token_expires_at,
    token_purpose, created_at, updated_at
"#;

pub(crate) const TASKER_PROFILE_COLUMNS: &str = r#"
    user_id, bio, experience_years, service_cities, verification_status,
    id_document_path, verification_note, rating_average, rating_count,
    completed_bookings, is_available, created_at, updated_at
"#;

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub locale: Locale,
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(
        &self,
        page: u32,
        limit: usize,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn get_user_count(&self, role: Option<UserRole>) -> Result<i64, sqlx::Error>;

    /// Inserts the user, plus an empty tasker profile for taskers, in one transaction.
    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
        bio: Option<String>,
        locale: Option<Locale>,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, sqlx::Error>;

    async fn update_avatar_path(
        &self,
        user_id: Uuid,
        avatar_path: &str,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_verification_token(
        &self,
        user_id: Uuid,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
        purpose: TokenPurpose,
    ) -> Result<User, sqlx::Error>;

    async fn verifed_token(&self, token: &str) -> Result<(), sqlx::Error>;

    /// Sets the new hash and consumes the reset token.
    async fn reset_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<(), sqlx::Error>;

    async fn set_suspended(&self, user_id: Uuid, suspended: bool) -> Result<User, sqlx::Error>;

    /// Promotes a customer to tasker and creates the profile in one
    /// transaction. `None` when the user is not a customer.
    async fn become_tasker(
        &self,
        user_id: Uuid,
        bio: String,
        experience_years: i32,
        service_cities: Vec<String>,
    ) -> Result<Option<(User, TaskerProfile)>, sqlx::Error>;

    async fn clear_expired_tokens(&self) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(token) = token {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE verification_token = $1",
                USER_COLUMNS
            ))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(
        &self,
        page: u32,
        limit: usize,
        role: Option<UserRole>,
    ) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            USER_COLUMNS
        ))
        .bind(role)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_count(&self, role: Option<UserRole>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::user_role IS NULL OR role = $1)",
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone, password, role, locale, verification_token,
                               token_expires_at, token_purpose)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'email_verification')
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&new_user.name)
        .bind(new_user.email.to_lowercase())
        .bind(&new_user.phone)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.locale)
        .bind(&new_user.verification_token)
        .bind(new_user.token_expires_at)
        .fetch_one(&mut *tx)
        .await?;

        if user.role == UserRole::Tasker {
            sqlx::query("INSERT INTO tasker_profiles (user_id) VALUES ($1)")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        phone: Option<String>,
        bio: Option<String>,
        locale: Option<Locale>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                bio = COALESCE($4, bio),
                locale = COALESCE($5, locale),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(phone)
        .bind(bio)
        .bind(locale)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(password)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_avatar_path(
        &self,
        user_id: Uuid,
        avatar_path: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET avatar_path = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(avatar_path)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_verification_token(
        &self,
        user_id: Uuid,
        verification_token: &str,
        token_expires_at: DateTime<Utc>,
        purpose: TokenPurpose,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET verification_token = $2,
                token_expires_at = $3,
                token_purpose = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(verification_token)
        .bind(token_expires_at)
        .bind(purpose)
        .fetch_one(&self.pool)
        .await
    }

    async fn verifed_token(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET verified = true,
                verification_token = NULL,
                token_expires_at = NULL,
                token_purpose = NULL,
                updated_at = NOW()
            WHERE verification_token = $1 AND token_purpose = 'email_verification'
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reset_password(&self, user_id: Uuid, password: String) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password = $2,
                verification_token = NULL,
                token_expires_at = NULL,
                token_purpose = NULL,
                updated_at = NOW()
            WHERE id = $1 AND token_purpose = 'password_reset'
            "#,
        )
        .bind(user_id)
        .bind(password)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_suspended(&self, user_id: Uuid, suspended: bool) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_suspended = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(suspended)
        .fetch_one(&self.pool)
        .await
    }

    async fn become_tasker(
        &self,
        user_id: Uuid,
        bio: String,
        experience_years: i32,
        service_cities: Vec<String>,
    ) -> Result<Option<(User, TaskerProfile)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = 'tasker', updated_at = NOW()
            WHERE id = $1 AND role = 'customer'
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            tx.rollback().await?;
            return Ok(None);
        };

        let profile = sqlx::query_as::<_, TaskerProfile>(&format!(
            r#"
            INSERT INTO tasker_profiles (user_id, bio, experience_years, service_cities)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET bio = EXCLUDED.bio,
                experience_years = EXCLUDED.experience_years,
                service_cities = EXCLUDED.service_cities,
                updated_at = NOW()
            RETURNING {}
            "#,
            TASKER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(bio)
        .bind(experience_years)
        .bind(service_cities)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((user, profile)))
    }

    async fn clear_expired_tokens(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_token = NULL, token_expires_at = NULL, token_purpose = NULL
            WHERE token_expires_at IS NOT NULL AND token_expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
