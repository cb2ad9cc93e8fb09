// db/walletdb.rs
use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::walletmodels::*;
use crate::utils::reference::generate_transaction_reference;

const WALLET_COLUMNS: &str = "id, user_id, balance, available_balance, currency, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = r#"
    id, wallet_id, kind, amount, balance_after, available_after, reference,
    booking_id, description, created_at
"#;

const HOLD_COLUMNS: &str =
    "id, wallet_id, amount, booking_id, refund_request_id, status, created_at, settled_at";

const TOPUP_COLUMNS: &str = r#"
    id, user_id, amount, receipt_path, status, admin_note, reviewed_by, created_at, reviewed_at
"#;

const REFUND_COLUMNS: &str = r#"
    id, user_id, amount, bank_name, account_holder, iban, receipt_path, status,
    admin_note, reviewed_by, created_at, reviewed_at
"#;

#[async_trait]
pub trait WalletExt {
    /// Wallets are created on first access.
    async fn get_or_create_wallet(&self, user_id: Uuid) -> Result<Wallet, sqlx::Error>;

    async fn get_wallet_transactions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<WalletTransaction>, i64), sqlx::Error>;

    async fn create_topup_request(
        &self,
        user_id: Uuid,
        amount: i64,
        receipt_path: &str,
    ) -> Result<TopupRequest, sqlx::Error>;

    async fn get_topup_request(&self, id: Uuid) -> Result<Option<TopupRequest>, sqlx::Error>;

    async fn get_topup_requests(
        &self,
        user_id: Option<Uuid>,
        status: Option<RequestStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<TopupRequest>, i64), sqlx::Error>;

    async fn get_refund_request(&self, id: Uuid) -> Result<Option<RefundRequest>, sqlx::Error>;

    async fn get_refund_requests(
        &self,
        user_id: Option<Uuid>,
        status: Option<RequestStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<RefundRequest>, i64), sqlx::Error>;
}

#[async_trait]
impl WalletExt for DBClient {
    async fn get_or_create_wallet(&self, user_id: Uuid) -> Result<Wallet, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        ensure_wallet(&mut conn, user_id).await?;

        sqlx::query_as::<_, Wallet>(&format!(
            "SELECT {} FROM wallets WHERE user_id = $1",
            WALLET_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
    }

    async fn get_wallet_transactions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<WalletTransaction>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let transactions = sqlx::query_as::<_, WalletTransaction>(&format!(
            r#"
            SELECT {} FROM wallet_transactions
            WHERE wallet_id = (SELECT id FROM wallets WHERE user_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM wallet_transactions WHERE wallet_id = (SELECT id FROM wallets WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((transactions, total))
    }

    async fn create_topup_request(
        &self,
        user_id: Uuid,
        amount: i64,
        receipt_path: &str,
    ) -> Result<TopupRequest, sqlx::Error> {
        sqlx::query_as::<_, TopupRequest>(&format!(
            "INSERT INTO topup_requests (user_id, amount, receipt_path) VALUES ($1, $2, $3) RETURNING {}",
            TOPUP_COLUMNS
        ))
        .bind(user_id)
        .bind(amount)
        .bind(receipt_path)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_topup_request(&self, id: Uuid) -> Result<Option<TopupRequest>, sqlx::Error> {
        sqlx::query_as::<_, TopupRequest>(&format!(
            "SELECT {} FROM topup_requests WHERE id = $1",
            TOPUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_topup_requests(
        &self,
        user_id: Option<Uuid>,
        status: Option<RequestStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<TopupRequest>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let requests = sqlx::query_as::<_, TopupRequest>(&format!(
            r#"
            SELECT {} FROM topup_requests
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            TOPUP_COLUMNS
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM topup_requests
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((requests, total))
    }

    async fn get_refund_request(&self, id: Uuid) -> Result<Option<RefundRequest>, sqlx::Error> {
        sqlx::query_as::<_, RefundRequest>(&format!(
            "SELECT {} FROM refund_requests WHERE id = $1",
            REFUND_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_refund_requests(
        &self,
        user_id: Option<Uuid>,
        status: Option<RequestStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<RefundRequest>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let requests = sqlx::query_as::<_, RefundRequest>(&format!(
            r#"
            SELECT {} FROM refund_requests
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            REFUND_COLUMNS
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM refund_requests
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::request_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((requests, total))
    }
}

// Statement helpers that run on a caller's transaction. Money rules live in
// `service::wallet_service`; these only read and write rows.

async fn ensure_wallet(conn: &mut PgConnection, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Row-locks the user's wallet for the rest of the transaction.
pub(crate) async fn lock_wallet(conn: &mut PgConnection, user_id: Uuid) -> Result<Wallet, sqlx::Error> {
    ensure_wallet(conn, user_id).await?;

    sqlx::query_as::<_, Wallet>(&format!(
        "SELECT {} FROM wallets WHERE user_id = $1 FOR UPDATE",
        WALLET_COLUMNS
    ))
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await
}

/// Writes new balances plus the matching ledger row.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn write_movement(
    conn: &mut PgConnection,
    wallet: &Wallet,
    kind: WalletTransactionKind,
    amount: i64,
    balance_after: i64,
    available_after: i64,
    booking_id: Option<Uuid>,
    description: &str,
) -> Result<WalletTransaction, sqlx::Error> {
    sqlx::query(
        "UPDATE wallets SET balance = $2, available_balance = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(wallet.id)
    .bind(balance_after)
    .bind(available_after)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, WalletTransaction>(&format!(
        r#"
        INSERT INTO wallet_transactions
            (wallet_id, kind, amount, balance_after, available_after, reference, booking_id, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        TRANSACTION_COLUMNS
    ))
    .bind(wallet.id)
    .bind(kind)
    .bind(kind.ledger_amount(amount))
    .bind(balance_after)
    .bind(available_after)
    .bind(generate_transaction_reference())
    .bind(booking_id)
    .bind(description)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn insert_hold(
    conn: &mut PgConnection,
    wallet_id: Uuid,
    amount: i64,
    booking_id: Option<Uuid>,
    refund_request_id: Option<Uuid>,
) -> Result<WalletHold, sqlx::Error> {
    sqlx::query_as::<_, WalletHold>(&format!(
        r#"
        INSERT INTO wallet_holds (wallet_id, amount, booking_id, refund_request_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        HOLD_COLUMNS
    ))
    .bind(wallet_id)
    .bind(amount)
    .bind(booking_id)
    .bind(refund_request_id)
    .fetch_one(&mut *conn)
    .await
}

/// Settles the active hold for a booking or refund request. The
/// `status = 'active'` guard makes a second settlement return `None`.
pub(crate) async fn settle_hold(
    conn: &mut PgConnection,
    booking_id: Option<Uuid>,
    refund_request_id: Option<Uuid>,
    new_status: HoldStatus,
) -> Result<Option<WalletHold>, sqlx::Error> {
    sqlx::query_as::<_, WalletHold>(&format!(
        r#"
        UPDATE wallet_holds
        SET status = $3, settled_at = NOW()
        WHERE status = 'active'
          AND (($1::uuid IS NOT NULL AND booking_id = $1)
               OR ($2::uuid IS NOT NULL AND refund_request_id = $2))
        RETURNING {}
        "#,
        HOLD_COLUMNS
    ))
    .bind(booking_id)
    .bind(refund_request_id)
    .bind(new_status)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn insert_refund_request(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: i64,
    bank_name: &str,
    account_holder: &str,
    iban: &str,
) -> Result<RefundRequest, sqlx::Error> {
    sqlx::query_as::<_, RefundRequest>(&format!(
        r#"
        INSERT INTO refund_requests (user_id, amount, bank_name, account_holder, iban)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        REFUND_COLUMNS
    ))
    .bind(user_id)
    .bind(amount)
    .bind(bank_name)
    .bind(account_holder)
    .bind(iban)
    .fetch_one(&mut *conn)
    .await
}

/// Moves a pending top-up to its final status; `None` if it was already reviewed.
pub(crate) async fn review_topup(
    conn: &mut PgConnection,
    id: Uuid,
    status: RequestStatus,
    admin_id: Uuid,
    note: Option<&str>,
) -> Result<Option<TopupRequest>, sqlx::Error> {
    sqlx::query_as::<_, TopupRequest>(&format!(
        r#"
        UPDATE topup_requests
        SET status = $2, reviewed_by = $3, admin_note = $4, reviewed_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {}
        "#,
        TOPUP_COLUMNS
    ))
    .bind(id)
    .bind(status)
    .bind(admin_id)
    .bind(note)
    .fetch_optional(&mut *conn)
    .await
}

pub(crate) async fn review_refund(
    conn: &mut PgConnection,
    id: Uuid,
    status: RequestStatus,
    admin_id: Uuid,
    note: Option<&str>,
) -> Result<Option<RefundRequest>, sqlx::Error> {
    sqlx::query_as::<_, RefundRequest>(&format!(
        r#"
        UPDATE refund_requests
        SET status = $2, reviewed_by = $3, admin_note = $4, reviewed_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {}
        "#,
        REFUND_COLUMNS
    ))
    .bind(id)
    .bind(status)
    .bind(admin_id)
    .bind(note)
    .fetch_optional(&mut *conn)
    .await
}
