// service/wallet_service.rs
use std::sync::Arc;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient,
        userdb::UserExt,
        walletdb::{self, WalletExt},
    },
    models::walletmodels::*,
    service::{error::ServiceError, notification_service::NotificationService},
};

fn plan_movement(wallet: &Wallet, kind: WalletTransactionKind, amount: i64) -> Result<(i64, i64), ServiceError> {
    wallet.after(kind, amount).ok_or(ServiceError::InsufficientFunds {
        required: amount,
        available: wallet.available_balance,
    })
}

/// Applies one ledgered movement to a user's wallet. The wallet row stays
/// locked until the caller's transaction ends.
pub async fn apply_movement(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: WalletTransactionKind,
    amount: i64,
    booking_id: Option<Uuid>,
    description: &str,
) -> Result<WalletTransaction, ServiceError> {
    let wallet = walletdb::lock_wallet(conn, user_id).await?;

    let (balance_after, available_after) = plan_movement(&wallet, kind, amount)?;

    let transaction = walletdb::write_movement(
        conn,
        &wallet,
        kind,
        amount,
        balance_after,
        available_after,
        booking_id,
        description,
    )
    .await?;

    tracing::debug!(
        "Wallet {} {} {} -> balance {}, available {}",
        wallet.id,
        kind.to_str(),
        amount,
        balance_after,
        available_after
    );

    Ok(transaction)
}

/// Reserves `amount` of the customer's available balance for a booking.
pub async fn place_booking_hold(
    conn: &mut PgConnection,
    customer_id: Uuid,
    booking_id: Uuid,
    amount: i64,
) -> Result<WalletHold, ServiceError> {
    let transaction = apply_movement(
        conn,
        customer_id,
        WalletTransactionKind::BookingHold,
        amount,
        Some(booking_id),
        "Funds reserved for booking",
    )
    .await?;

    Ok(walletdb::insert_hold(conn, transaction.wallet_id, amount, Some(booking_id), None).await?)
}

/// Gives a booking's held funds back to the customer.
pub async fn release_booking_hold(
    conn: &mut PgConnection,
    customer_id: Uuid,
    booking_id: Uuid,
) -> Result<WalletHold, ServiceError> {
    let hold = walletdb::settle_hold(conn, Some(booking_id), None, HoldStatus::Released)
        .await?
        .ok_or_else(|| ServiceError::Conflict("No active hold for this booking".to_string()))?;

    apply_movement(
        conn,
        customer_id,
        WalletTransactionKind::BookingRelease,
        hold.amount,
        Some(booking_id),
        "Booking funds released",
    )
    .await?;

    Ok(hold)
}

/// Moves a booking's held funds from the customer to the tasker and takes the
/// platform fee off the tasker's side.
pub async fn capture_booking_hold(
    conn: &mut PgConnection,
    customer_id: Uuid,
    tasker_id: Uuid,
    booking_id: Uuid,
    platform_fee: i64,
) -> Result<WalletHold, ServiceError> {
    // Wallets are always locked in uuid order.
    let (first, second) = if customer_id < tasker_id {
        (customer_id, tasker_id)
    } else {
        (tasker_id, customer_id)
    };
    walletdb::lock_wallet(conn, first).await?;
    walletdb::lock_wallet(conn, second).await?;

    let hold = walletdb::settle_hold(conn, Some(booking_id), None, HoldStatus::Captured)
        .await?
        .ok_or_else(|| ServiceError::Conflict("No active hold for this booking".to_string()))?;

    apply_movement(
        conn,
        customer_id,
        WalletTransactionKind::BookingPayment,
        hold.amount,
        Some(booking_id),
        "Booking payment",
    )
    .await?;

    apply_movement(
        conn,
        tasker_id,
        WalletTransactionKind::BookingEarning,
        hold.amount,
        Some(booking_id),
        "Booking earning",
    )
    .await?;

    if platform_fee > 0 {
        apply_movement(
            conn,
            tasker_id,
            WalletTransactionKind::PlatformFee,
            platform_fee,
            Some(booking_id),
            "Platform fee",
        )
        .await?;
    }

    Ok(hold)
}

#[derive(Debug, Clone)]
pub struct WalletService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
}

impl WalletService {
    pub fn new(db_client: Arc<DBClient>, notification_service: Arc<NotificationService>) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn request_topup(
        &self,
        user_id: Uuid,
        amount: i64,
        receipt_path: &str,
    ) -> Result<TopupRequest, ServiceError> {
        let request = self
            .db_client
            .create_topup_request(user_id, amount, receipt_path)
            .await?;

        tracing::info!("Top-up request {} for {} centimes from {}", request.id, amount, user_id);
        Ok(request)
    }

    /// Withdrawal to a bank account. The amount is held until an admin pays
    /// it out or rejects the request.
    pub async fn request_refund(
        &self,
        user_id: Uuid,
        amount: i64,
        bank_name: &str,
        account_holder: &str,
        iban: &str,
    ) -> Result<RefundRequest, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let wallet = walletdb::lock_wallet(&mut *tx, user_id).await?;
        plan_movement(&wallet, WalletTransactionKind::RefundRequestHold, amount)?;

        let compact_iban: String = iban.chars().filter(|c| !c.is_whitespace()).collect();
        let request = walletdb::insert_refund_request(
            &mut *tx,
            user_id,
            amount,
            bank_name.trim(),
            account_holder.trim(),
            &compact_iban.to_uppercase(),
        )
        .await?;

        apply_movement(
            &mut *tx,
            user_id,
            WalletTransactionKind::RefundRequestHold,
            amount,
            None,
            &format!("Refund request {}", request.id),
        )
        .await?;
        walletdb::insert_hold(&mut *tx, wallet.id, amount, None, Some(request.id)).await?;

        tx.commit().await?;

        tracing::info!("Refund request {} for {} centimes from {}", request.id, amount, user_id);
        Ok(request)
    }

    pub async fn review_topup(
        &self,
        admin_id: Uuid,
        request_id: Uuid,
        approved: bool,
        note: Option<&str>,
    ) -> Result<TopupRequest, ServiceError> {
        let status = if approved { RequestStatus::Approved } else { RequestStatus::Rejected };
        let mut tx = self.db_client.pool.begin().await?;

        let request = match walletdb::review_topup(&mut *tx, request_id, status, admin_id, note).await? {
            Some(request) => request,
            None => return Err(self.missing_or_reviewed(self.db_client.get_topup_request(request_id).await?.is_some())),
        };

        if approved {
            apply_movement(
                &mut *tx,
                request.user_id,
                WalletTransactionKind::Topup,
                request.amount,
                None,
                &format!("Top-up {}", request.id),
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!("Top-up {} {} by admin {}", request.id, status.to_str(), admin_id);

        self.notification_service
            .notify_topup_reviewed(request.user_id, request.id, status, request.amount)
            .await;
        if approved {
            let locale = match self.db_client.get_user(Some(request.user_id), None, None).await {
                Ok(Some(user)) => user.locale,
                _ => Default::default(),
            };
            self.notification_service
                .notify_wallet_credited(request.user_id, request.amount, locale)
                .await;
        }

        Ok(request)
    }

    pub async fn review_refund(
        &self,
        admin_id: Uuid,
        request_id: Uuid,
        approved: bool,
        note: Option<&str>,
    ) -> Result<RefundRequest, ServiceError> {
        let status = if approved { RequestStatus::Approved } else { RequestStatus::Rejected };
        let mut tx = self.db_client.pool.begin().await?;

        let request = match walletdb::review_refund(&mut *tx, request_id, status, admin_id, note).await? {
            Some(request) => request,
            None => return Err(self.missing_or_reviewed(self.db_client.get_refund_request(request_id).await?.is_some())),
        };

        let hold_status = if approved { HoldStatus::Captured } else { HoldStatus::Released };
        let hold = walletdb::settle_hold(&mut *tx, None, Some(request.id), hold_status)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Refund hold was already settled".to_string()))?;

        let (kind, description) = if approved {
            (WalletTransactionKind::RefundPaid, format!("Refund {} paid out", request.id))
        } else {
            (WalletTransactionKind::RefundRequestRelease, format!("Refund {} rejected", request.id))
        };
        apply_movement(&mut *tx, request.user_id, kind, hold.amount, None, &description).await?;

        tx.commit().await?;

        tracing::info!("Refund {} {} by admin {}", request.id, status.to_str(), admin_id);

        self.notification_service
            .notify_refund_reviewed(request.user_id, request.id, status, request.amount)
            .await;

        Ok(request)
    }

    fn missing_or_reviewed(&self, exists: bool) -> ServiceError {
        if exists {
            ServiceError::Conflict("Request has already been reviewed".to_string())
        } else {
            ServiceError::NotFound("Request not found".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn wallet(balance: i64, available: i64) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            balance,
            available_balance: available,
            currency: "MAD".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn refund_above_available_balance_needs_payment() {
        let w = wallet(10_000, 4_000);
        let err = plan_movement(&w, WalletTransactionKind::RefundRequestHold, 5_000).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InsufficientFunds { required: 5_000, available: 4_000 }
        ));

        let http: HttpError = err.into();
        assert_eq!(http.status, StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn refund_within_available_balance_is_held() {
        let w = wallet(10_000, 4_000);
        assert_eq!(
            plan_movement(&w, WalletTransactionKind::RefundRequestHold, 4_000).ok(),
            Some((10_000, 0))
        );
    }
}
