// db/reviewdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::reviewmodel::{Review, ReviewWithAuthor};

#[async_trait]
pub trait ReviewExt {
    /// Inserts the review and recomputes the tasker's rating in one transaction.
    async fn create_review(
        &self,
        booking_id: Uuid,
        customer_id: Uuid,
        tasker_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, sqlx::Error>;

    async fn get_review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>, sqlx::Error>;

    async fn get_tasker_reviews(
        &self,
        tasker_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ReviewWithAuthor>, i64), sqlx::Error>;
}

const LOCK_TASKER_PROFILE: &str = "SELECT user_id FROM tasker_profiles WHERE user_id = $1 FOR UPDATE";

#[async_trait]
impl ReviewExt for DBClient {
    async fn create_review(
        &self,
        booking_id: Uuid,
        customer_id: Uuid,
        tasker_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Concurrent reviews for one tasker recompute the rating one at a time.
        sqlx::query(LOCK_TASKER_PROFILE)
            .bind(tasker_id)
            .execute(&mut *tx)
            .await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (booking_id, customer_id, tasker_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, booking_id, customer_id, tasker_id, rating, comment, created_at
            "#,
        )
        .bind(booking_id)
        .bind(customer_id)
        .bind(tasker_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE tasker_profiles tp
            SET rating_average = stats.average,
                rating_count = stats.count,
                updated_at = NOW()
            FROM (
                SELECT COALESCE(AVG(rating), 0)::double precision AS average,
                       COUNT(*)::int AS count
                FROM reviews WHERE tasker_id = $1
            ) stats
            WHERE tp.user_id = $1
            "#,
        )
        .bind(tasker_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(review)
    }

    async fn get_review_for_booking(&self, booking_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            "SELECT id, booking_id, customer_id, tasker_id, rating, comment, created_at FROM reviews WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_tasker_reviews(
        &self,
        tasker_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<ReviewWithAuthor>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.booking_id, r.rating, r.comment,
                   u.name AS customer_name, u.avatar_path AS customer_avatar_path,
                   r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.customer_id
            WHERE r.tasker_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tasker_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE tasker_id = $1")
            .bind(tasker_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((reviews, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_recompute_locks_the_profile_row() {
        assert!(LOCK_TASKER_PROFILE.ends_with("FOR UPDATE"));
        assert!(LOCK_TASKER_PROFILE.contains("tasker_profiles"));
    }
}
