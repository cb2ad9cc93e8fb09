// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{db::userdb::UserExt, AppState};

/// Cancels pending bookings that were never accepted. Runs hourly.
pub async fn start_booking_expiry_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(3600));

    loop {
        interval.tick().await;

        tracing::info!("Running booking expiry job at {}", Utc::now());

        match app_state
            .booking_service
            .expire_stale_bookings(app_state.env.pending_booking_ttl_hours)
            .await
        {
            Ok(count) => tracing::info!("Booking expiry job completed: {} bookings expired", count),
            Err(e) => tracing::error!("Booking expiry job failed: {}", e),
        }
    }
}

/// Clears expired verification and password reset tokens. Runs every 6 hours.
pub async fn start_token_cleanup_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(21600));

    loop {
        interval.tick().await;

        match app_state.db_client.clear_expired_tokens().await {
            Ok(cleared) => tracing::info!("Token cleanup job completed: {} tokens cleared", cleared),
            Err(e) => tracing::error!("Token cleanup job failed: {}", e),
        }
    }
}
