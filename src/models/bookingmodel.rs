use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
    Refunded,
}

impl BookingStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Disputed => "disputed",
            BookingStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }

    /// Statuses in which the customer's money sits in an active wallet hold.
    pub fn holds_funds(&self) -> bool {
        matches!(
            self,
            BookingStatus::Confirmed | BookingStatus::InProgress | BookingStatus::Disputed
        )
    }
}

/// Who is asking for a booking to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingActor {
    Customer,
    Tasker,
    Admin,
}

/// Money movement that must accompany a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEffect {
    None,
    /// Reserve `total_amount` from the customer's available balance.
    PlaceHold,
    /// Return the held amount to the customer.
    ReleaseHold,
    /// Debit the customer and pay the tasker minus the platform fee.
    CaptureHold,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No actor may make this move.
    Invalid { from: BookingStatus, to: BookingStatus },
    /// The move exists but belongs to someone else.
    NotAllowed { actor: BookingActor, to: BookingStatus },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::Invalid { from, to } => write!(
                f,
                "Booking cannot move from {} to {}",
                from.to_str(),
                to.to_str()
            ),
            TransitionError::NotAllowed { actor, to } => write!(
                f,
                "A {:?} cannot move this booking to {}",
                actor,
                to.to_str()
            ),
        }
    }
}

struct Rule {
    from: &'static [BookingStatus],
    to: BookingStatus,
    actors: &'static [BookingActor],
    effect: WalletEffect,
}

use BookingActor as A;
use BookingStatus as S;

const RULES: &[Rule] = &[
    Rule { from: &[S::Pending], to: S::Accepted, actors: &[A::Tasker], effect: WalletEffect::None },
    Rule { from: &[S::Pending, S::Accepted], to: S::Cancelled, actors: &[A::Customer, A::Tasker], effect: WalletEffect::None },
    Rule { from: &[S::Accepted], to: S::Confirmed, actors: &[A::Customer], effect: WalletEffect::PlaceHold },
    Rule { from: &[S::Confirmed], to: S::InProgress, actors: &[A::Tasker], effect: WalletEffect::None },
    Rule { from: &[S::Confirmed], to: S::Cancelled, actors: &[A::Customer, A::Tasker], effect: WalletEffect::ReleaseHold },
    Rule { from: &[S::Confirmed, S::InProgress], to: S::Disputed, actors: &[A::Customer, A::Tasker], effect: WalletEffect::None },
    Rule { from: &[S::InProgress], to: S::Completed, actors: &[A::Tasker], effect: WalletEffect::CaptureHold },
    Rule { from: &[S::Disputed], to: S::Completed, actors: &[A::Admin], effect: WalletEffect::CaptureHold },
    Rule { from: &[S::Disputed], to: S::Refunded, actors: &[A::Admin], effect: WalletEffect::ReleaseHold },
];

/// Validates a status change and returns the wallet effect it carries.
pub fn check_transition(
    from: BookingStatus,
    to: BookingStatus,
    actor: BookingActor,
) -> Result<WalletEffect, TransitionError> {
    let rule = RULES
        .iter()
        .find(|rule| rule.to == to && rule.from.contains(&from))
        .ok_or(TransitionError::Invalid { from, to })?;

    if !rule.actors.contains(&actor) {
        return Err(TransitionError::NotAllowed { actor, to });
    }

    Ok(rule.effect)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub tasker_id: Uuid,
    pub service_id: Uuid,
    pub address_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub hours: Option<i32>,
    pub total_amount: i64, // in centimes
    pub platform_fee: i64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn actor_for(&self, user_id: Uuid, is_admin: bool) -> Option<BookingActor> {
        if user_id == self.customer_id {
            Some(BookingActor::Customer)
        } else if user_id == self.tasker_id {
            Some(BookingActor::Tasker)
        } else if is_admin {
            Some(BookingActor::Admin)
        } else {
            None
        }
    }

    /// The participant who should hear about a change made by `actor`.
    pub fn counterparty(&self, actor: BookingActor) -> Vec<Uuid> {
        match actor {
            BookingActor::Customer => vec![self.tasker_id],
            BookingActor::Tasker => vec![self.customer_id],
            BookingActor::Admin => vec![self.customer_id, self.tasker_id],
        }
    }

    pub fn tasker_earning(&self) -> i64 {
        self.total_amount - self.platform_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_to_completion() {
        assert_eq!(check_transition(S::Pending, S::Accepted, A::Tasker), Ok(WalletEffect::None));
        assert_eq!(check_transition(S::Accepted, S::Confirmed, A::Customer), Ok(WalletEffect::PlaceHold));
        assert_eq!(check_transition(S::Confirmed, S::InProgress, A::Tasker), Ok(WalletEffect::None));
        assert_eq!(check_transition(S::InProgress, S::Completed, A::Tasker), Ok(WalletEffect::CaptureHold));
    }

    #[test]
    fn cancelling_after_confirmation_refunds() {
        assert_eq!(check_transition(S::Pending, S::Cancelled, A::Customer), Ok(WalletEffect::None));
        assert_eq!(check_transition(S::Accepted, S::Cancelled, A::Tasker), Ok(WalletEffect::None));
        assert_eq!(check_transition(S::Confirmed, S::Cancelled, A::Customer), Ok(WalletEffect::ReleaseHold));
        assert_eq!(
            check_transition(S::InProgress, S::Cancelled, A::Customer),
            Err(TransitionError::Invalid { from: S::InProgress, to: S::Cancelled })
        );
    }

    #[test]
    fn disputes_are_settled_by_admins_only() {
        assert_eq!(check_transition(S::InProgress, S::Disputed, A::Customer), Ok(WalletEffect::None));
        assert_eq!(check_transition(S::Disputed, S::Refunded, A::Admin), Ok(WalletEffect::ReleaseHold));
        assert_eq!(check_transition(S::Disputed, S::Completed, A::Admin), Ok(WalletEffect::CaptureHold));
        assert_eq!(
            check_transition(S::Disputed, S::Refunded, A::Customer),
            Err(TransitionError::NotAllowed { actor: A::Customer, to: S::Refunded })
        );
        assert_eq!(
            check_transition(S::Disputed, S::Completed, A::Tasker),
            Err(TransitionError::NotAllowed { actor: A::Tasker, to: S::Completed })
        );
    }

    #[test]
    fn wrong_party_is_refused() {
        assert_eq!(
            check_transition(S::Pending, S::Accepted, A::Customer),
            Err(TransitionError::NotAllowed { actor: A::Customer, to: S::Accepted })
        );
        assert_eq!(
            check_transition(S::Accepted, S::Confirmed, A::Tasker),
            Err(TransitionError::NotAllowed { actor: A::Tasker, to: S::Confirmed })
        );
    }

    #[test]
    fn terminal_states_do_not_move() {
        let all = [
            S::Pending, S::Accepted, S::Confirmed, S::InProgress,
            S::Completed, S::Cancelled, S::Disputed, S::Refunded,
        ];
        for from in [S::Completed, S::Cancelled, S::Refunded] {
            assert!(from.is_terminal());
            for to in all {
                for actor in [A::Customer, A::Tasker, A::Admin] {
                    assert!(check_transition(from, to, actor).is_err(), "{:?} -> {:?}", from, to);
                }
            }
        }
    }

    #[test]
    fn funds_are_held_exactly_where_capture_or_release_can_follow() {
        for rule in RULES {
            if matches!(rule.effect, WalletEffect::CaptureHold | WalletEffect::ReleaseHold) {
                assert!(rule.from.iter().all(|s| s.holds_funds()));
            }
        }
    }

    #[test]
    fn actor_resolution() {
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            tasker_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            address_id: None,
            scheduled_at: Utc::now(),
            hours: None,
            total_amount: 20_000,
            platform_fee: 2_000,
            status: S::Pending,
            notes: None,
            cancellation_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(booking.actor_for(booking.customer_id, false), Some(A::Customer));
        assert_eq!(booking.actor_for(booking.tasker_id, true), Some(A::Tasker));
        assert_eq!(booking.actor_for(Uuid::new_v4(), true), Some(A::Admin));
        assert_eq!(booking.actor_for(Uuid::new_v4(), false), None);
        assert_eq!(booking.counterparty(A::Tasker), vec![booking.customer_id]);
        assert_eq!(booking.tasker_earning(), 18_000);
    }
}
