// db/bookingdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use super::db::DBClient;
use crate::dtos::bookingdtos::BookingSide;
use crate::models::bookingmodel::{Booking, BookingStatus};

pub(crate) const BOOKING_COLUMNS: &str = r#"
    id, customer_id, tasker_id, service_id, address_id, scheduled_at, hours,
    total_amount, platform_fee, status, notes, cancellation_reason,
    created_at, updated_at
"#;

pub struct NewBooking {
    pub customer_id: Uuid,
    pub tasker_id: Uuid,
    pub service_id: Uuid,
    pub address_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub hours: Option<i32>,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub notes: Option<String>,
}

#[async_trait]
pub trait BookingExt {
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, sqlx::Error>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error>;

    async fn get_user_bookings(
        &self,
        user_id: Uuid,
        side: Option<BookingSide>,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Booking>, i64), sqlx::Error>;

    async fn get_bookings_by_status(
        &self,
        status: BookingStatus,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Booking>, i64), sqlx::Error>;

    /// Cancels pending bookings created before `cutoff`, returning them.
    async fn expire_pending_bookings(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>, sqlx::Error>;
}

#[async_trait]
impl BookingExt for DBClient {
    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO service_bookings (customer_id, tasker_id, service_id, address_id,
                                          scheduled_at, hours, total_amount, platform_fee, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.customer_id)
        .bind(booking.tasker_id)
        .bind(booking.service_id)
        .bind(booking.address_id)
        .bind(booking.scheduled_at)
        .bind(booking.hours)
        .bind(booking.total_amount)
        .bind(booking.platform_fee)
        .bind(booking.notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM service_bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_bookings(
        &self,
        user_id: Uuid,
        side: Option<BookingSide>,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Booking>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let side_clause = match side {
            Some(BookingSide::Customer) => "customer_id = $1",
            Some(BookingSide::Tasker) => "tasker_id = $1",
            None => "(customer_id = $1 OR tasker_id = $1)",
        };

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            r#"
            SELECT {} FROM service_bookings
            WHERE {} AND ($2::booking_status IS NULL OR status = $2)
            ORDER BY scheduled_at DESC
            LIMIT $3 OFFSET $4
            "#,
            BOOKING_COLUMNS, side_clause
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM service_bookings WHERE {} AND ($2::booking_status IS NULL OR status = $2)",
            side_clause
        ))
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((bookings, total))
    }

    async fn get_bookings_by_status(
        &self,
        status: BookingStatus,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Booking>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {} FROM service_bookings WHERE status = $1 ORDER BY updated_at ASC LIMIT $2 OFFSET $3",
            BOOKING_COLUMNS
        ))
        .bind(status)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service_bookings WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok((bookings, total))
    }

    async fn expire_pending_bookings(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE service_bookings
            SET status = 'cancelled', cancellation_reason = 'expired', updated_at = NOW()
            WHERE status = 'pending' AND created_at < $1
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
    }
}

/// Only cancellations record a reason; other moves keep the stored one.
fn cancellation_reason_for(to: BookingStatus, reason: Option<&str>) -> Option<&str> {
    match to {
        BookingStatus::Cancelled => reason,
        _ => None,
    }
}

/// Moves a booking from `from` to `to` on the caller's transaction. Returns
/// `None` when the row is no longer in `from`.
pub(crate) async fn update_booking_status(
    conn: &mut PgConnection,
    booking_id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
    reason: Option<&str>,
) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(&format!(
        r#"
        UPDATE service_bookings
        SET status = $3,
            cancellation_reason = COALESCE($4, cancellation_reason),
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {}
        "#,
        BOOKING_COLUMNS
    ))
    .bind(booking_id)
    .bind(from)
    .bind(to)
    .bind(cancellation_reason_for(to, reason))
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn increment_completed_bookings(conn: &mut PgConnection, tasker_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE tasker_profiles SET completed_bookings = completed_bookings + 1, updated_at = NOW() WHERE user_id = $1",
    )
    .bind(tasker_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_kept_for_cancellations_only() {
        assert_eq!(
            cancellation_reason_for(BookingStatus::Cancelled, Some("Customer moved out")),
            Some("Customer moved out")
        );
        assert_eq!(cancellation_reason_for(BookingStatus::Disputed, Some("Never showed up")), None);
        assert_eq!(cancellation_reason_for(BookingStatus::Completed, Some("done")), None);
        assert_eq!(cancellation_reason_for(BookingStatus::Cancelled, None), None);
    }
}
