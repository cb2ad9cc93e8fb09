// models/walletmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "wallet_transaction_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    Topup,
    BookingHold,
    BookingRelease,
    BookingPayment,
    BookingEarning,
    PlatformFee,
    RefundRequestHold,
    RefundRequestRelease,
    RefundPaid,
}

impl WalletTransactionKind {
    pub fn to_str(&self) -> &str {
        match self {
            WalletTransactionKind::Topup => "topup",
            WalletTransactionKind::BookingHold => "booking_hold",
            WalletTransactionKind::BookingRelease => "booking_release",
            WalletTransactionKind::BookingPayment => "booking_payment",
            WalletTransactionKind::BookingEarning => "booking_earning",
            WalletTransactionKind::PlatformFee => "platform_fee",
            WalletTransactionKind::RefundRequestHold => "refund_request_hold",
            WalletTransactionKind::RefundRequestRelease => "refund_request_release",
            WalletTransactionKind::RefundPaid => "refund_paid",
        }
    }

    /// How `amount` moves `(balance, available_balance)` for this kind.
    /// Holds only touch the available part; captures only touch the total.
    pub fn effect(&self, amount: i64) -> (i64, i64) {
        match self {
            WalletTransactionKind::Topup | WalletTransactionKind::BookingEarning => (amount, amount),
            WalletTransactionKind::BookingHold | WalletTransactionKind::RefundRequestHold => (0, -amount),
            WalletTransactionKind::BookingRelease | WalletTransactionKind::RefundRequestRelease => (0, amount),
            WalletTransactionKind::BookingPayment | WalletTransactionKind::RefundPaid => (-amount, 0),
            WalletTransactionKind::PlatformFee => (-amount, -amount),
        }
    }

    /// Signed amount written to the ledger row.
    pub fn ledger_amount(&self, amount: i64) -> i64 {
        match self.effect(amount) {
            (0, available) => available,
            (balance, _) => balance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "hold_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Active,
    Captured,
    Released,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn to_str(&self) -> &str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: i64, // in centimes
    pub available_balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn held_amount(&self) -> i64 {
        self.balance - self.available_balance
    }

    /// Balances after applying `kind`, or `None` when the move would break
    /// `0 <= available_balance <= balance`.
    pub fn after(&self, kind: WalletTransactionKind, amount: i64) -> Option<(i64, i64)> {
        if amount <= 0 {
            return None;
        }
        let (balance_delta, available_delta) = kind.effect(amount);
        let balance = self.balance + balance_delta;
        let available = self.available_balance + available_delta;

        if available < 0 || available > balance {
            None
        } else {
            Some((balance, available))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: WalletTransactionKind,
    pub amount: i64, // signed, in centimes
    pub balance_after: i64,
    pub available_after: i64,
    pub reference: String,
    pub booking_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WalletHold {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub booking_id: Option<Uuid>,
    pub refund_request_id: Option<Uuid>,
    pub status: HoldStatus,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopupRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub receipt_path: Option<String>,
    pub status: RequestStatus,
    pub admin_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefundRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub bank_name: String,
    pub account_holder: String,
    pub iban: String,
    pub receipt_path: Option<String>,
    pub status: RequestStatus,
    pub admin_note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::currency::CURRENCY_CODE;

    fn wallet(balance: i64, available: i64) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            balance,
            available_balance: available,
            currency: CURRENCY_CODE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn held_amount_is_the_gap() {
        let w = wallet(50_000, 30_000);
        assert_eq!(w.held_amount(), 20_000);
    }

    #[test]
    fn holds_only_touch_available() {
        let w = wallet(10_000, 10_000);
        assert_eq!(w.after(WalletTransactionKind::BookingHold, 4_000), Some((10_000, 6_000)));
        assert_eq!(w.after(WalletTransactionKind::BookingHold, 10_001), None);
        assert_eq!(WalletTransactionKind::BookingHold.ledger_amount(4_000), -4_000);
    }

    #[test]
    fn capture_reduces_total_of_held_money() {
        let w = wallet(10_000, 6_000);
        assert_eq!(w.after(WalletTransactionKind::BookingPayment, 4_000), Some((6_000, 6_000)));
        // Capturing more than is held would leave available above balance.
        assert_eq!(w.after(WalletTransactionKind::BookingPayment, 4_001), None);
        assert_eq!(WalletTransactionKind::RefundPaid.ledger_amount(4_000), -4_000);
    }

    #[test]
    fn release_cannot_exceed_held_amount() {
        let w = wallet(10_000, 6_000);
        assert_eq!(w.after(WalletTransactionKind::BookingRelease, 4_000), Some((10_000, 10_000)));
        assert_eq!(w.after(WalletTransactionKind::RefundRequestRelease, 4_001), None);
    }

    #[test]
    fn credits_and_fees_move_both_balances() {
        let w = wallet(0, 0);
        assert_eq!(w.after(WalletTransactionKind::Topup, 5_000), Some((5_000, 5_000)));
        assert_eq!(w.after(WalletTransactionKind::PlatformFee, 1), None);
        assert_eq!(WalletTransactionKind::BookingEarning.ledger_amount(700), 700);
        assert_eq!(WalletTransactionKind::PlatformFee.ledger_amount(70), -70);
    }

    #[test]
    fn zero_or_negative_amounts_are_refused() {
        let w = wallet(1_000, 1_000);
        assert_eq!(w.after(WalletTransactionKind::Topup, 0), None);
        assert_eq!(w.after(WalletTransactionKind::Topup, -5), None);
    }
}
