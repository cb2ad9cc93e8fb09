// service/booking_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    db::{
        addressdb::AddressExt,
        bookingdb::{self, BookingExt, NewBooking},
        db::DBClient,
        taskerdb::TaskerExt,
        userdb::UserExt,
    },
    dtos::bookingdtos::{CreateBookingDto, DisputeOutcome},
    mail::{mails::send_booking_status_email, sendmail::Mailer},
    models::{
        bookingmodel::*,
        taskermodel::TaskerService,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, notification_service::NotificationService, wallet_service},
    utils::{currency::platform_fee, sanitize::plain_text},
};

fn check_schedule(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if scheduled_at <= now {
        return Err(ServiceError::Validation("Scheduled time must be in the future".to_string()));
    }
    Ok(())
}

/// Amount owed for `customer_id` booking `service` for `hours`.
fn quote_booking(customer_id: Uuid, service: &TaskerService, hours: Option<i32>) -> Result<i64, ServiceError> {
    if service.tasker_id == customer_id {
        return Err(ServiceError::Validation("You cannot book your own service".to_string()));
    }
    service.quote(hours).map_err(ServiceError::Validation)
}

#[derive(Debug, Clone)]
pub struct BookingService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    mailer: Arc<Mailer>,
    platform_fee_percent: i64,
    frontend_url: String,
}

impl BookingService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        mailer: Arc<Mailer>,
        platform_fee_percent: i64,
        frontend_url: String,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            mailer,
            platform_fee_percent,
            frontend_url,
        }
    }

    pub async fn create_booking(&self, customer: &User, dto: CreateBookingDto) -> Result<Booking, ServiceError> {
        if customer.role != UserRole::Customer {
            return Err(ServiceError::Forbidden("Only customers can book services".to_string()));
        }

        let now = Utc::now();
        check_schedule(dto.scheduled_at, now)?;

        let service = self
            .db_client
            .get_service(dto.service_id)
            .await?
            .filter(|service| service.is_active)
            .ok_or_else(|| ServiceError::NotFound("Service not found".to_string()))?;

        let total_amount = quote_booking(customer.id, &service, dto.hours)?;

        let tasker_available = self
            .db_client
            .get_tasker_profile(service.tasker_id)
            .await?
            .map(|profile| profile.is_available)
            .unwrap_or(false);
        if !tasker_available {
            return Err(ServiceError::Validation("This tasker is not taking bookings right now".to_string()));
        }

        if let Some(address_id) = dto.address_id {
            let owned = self
                .db_client
                .get_address(address_id)
                .await?
                .map(|address| address.is_owned_by(customer.id))
                .unwrap_or(false);
            if !owned {
                return Err(ServiceError::NotFound("Address not found".to_string()));
            }
        }

        let fee = platform_fee(total_amount, self.platform_fee_percent);

        let booking = self
            .db_client
            .create_booking(NewBooking {
                customer_id: customer.id,
                tasker_id: service.tasker_id,
                service_id: service.id,
                address_id: dto.address_id,
                scheduled_at: dto.scheduled_at,
                hours: dto.hours,
                total_amount,
                platform_fee: fee,
                notes: dto.notes.map(|notes| plain_text(&notes)),
            })
            .await?;

        tracing::info!(
            "Booking {} created by {} for service {} ({} centimes)",
            booking.id,
            customer.id,
            service.id,
            total_amount
        );

        self.notification_service
            .notify_booking_created(&booking, &service.title)
            .await;

        Ok(booking)
    }

    /// Booking visible to `user`: participants and admins only.
    pub async fn get_booking_for(&self, user: &User, booking_id: Uuid) -> Result<Booking, ServiceError> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        if booking.actor_for(user.id, user.is_admin()).is_none() {
            return Err(ServiceError::Forbidden("You are not part of this booking".to_string()));
        }
        Ok(booking)
    }

    pub async fn update_status(
        &self,
        user: &User,
        booking_id: Uuid,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, ServiceError> {
        let booking = self.get_booking_for(user, booking_id).await?;
        let actor = booking
            .actor_for(user.id, user.is_admin())
            .ok_or_else(|| ServiceError::Forbidden("You are not part of this booking".to_string()))?;

        let effect = check_transition(booking.status, to, actor)?;
        self.apply_transition(&booking, to, actor, effect, reason.as_deref()).await
    }

    pub async fn resolve_dispute(
        &self,
        admin: &User,
        booking_id: Uuid,
        outcome: DisputeOutcome,
        note: Option<String>,
    ) -> Result<Booking, ServiceError> {
        if !admin.is_admin() {
            return Err(ServiceError::Forbidden("Only admins can resolve disputes".to_string()));
        }

        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        let to = outcome.target_status();
        let effect = check_transition(booking.status, to, BookingActor::Admin)?;
        let resolved = self
            .apply_transition(&booking, to, BookingActor::Admin, effect, note.as_deref())
            .await?;

        tracing::info!("Dispute on booking {} resolved as {} by {}", booking_id, to.to_str(), admin.id);
        Ok(resolved)
    }

    async fn apply_transition(
        &self,
        booking: &Booking,
        to: BookingStatus,
        actor: BookingActor,
        effect: WalletEffect,
        reason: Option<&str>,
    ) -> Result<Booking, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let updated = bookingdb::update_booking_status(&mut *tx, booking.id, booking.status, to, reason)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Booking was changed by someone else, reload and retry".to_string()))?;

        match effect {
            WalletEffect::None => {}
            WalletEffect::PlaceHold => {
                wallet_service::place_booking_hold(&mut *tx, updated.customer_id, updated.id, updated.total_amount)
                    .await?;
            }
            WalletEffect::ReleaseHold => {
                wallet_service::release_booking_hold(&mut *tx, updated.customer_id, updated.id).await?;
            }
            WalletEffect::CaptureHold => {
                wallet_service::capture_booking_hold(
                    &mut *tx,
                    updated.customer_id,
                    updated.tasker_id,
                    updated.id,
                    updated.platform_fee,
                )
                .await?;
                bookingdb::increment_completed_bookings(&mut *tx, updated.tasker_id).await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Booking {} moved {} -> {} by {:?}",
            updated.id,
            booking.status.to_str(),
            to.to_str(),
            actor
        );

        self.announce(&updated, &updated.counterparty(actor)).await;
        Ok(updated)
    }

    /// Notifications, realtime events and emails for a status change.
    /// Nothing here can fail the change itself.
    async fn announce(&self, booking: &Booking, recipients: &[Uuid]) {
        self.notification_service
            .notify_booking_status(booking, recipients)
            .await;

        if booking.status == BookingStatus::Disputed {
            match self.db_client.get_users(1, 50, Some(UserRole::Admin)).await {
                Ok(admins) => {
                    let admin_ids: Vec<Uuid> = admins.iter().map(|admin| admin.id).collect();
                    self.notification_service
                        .notify_booking_disputed(&admin_ids, booking)
                        .await;
                }
                Err(e) => tracing::error!("Failed to load admins for dispute {}: {}", booking.id, e),
            }
        }

        let link = format!("{}/bookings/{}", self.frontend_url.trim_end_matches('/'), booking.id);
        for recipient in recipients {
            let user = match self.db_client.get_user(Some(*recipient), None, None).await {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Failed to load user {} for booking email: {}", recipient, e);
                    continue;
                }
            };

            let mailer = self.mailer.clone();
            let status = booking.status;
            let link = link.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    send_booking_status_email(&mailer, &user.email, &user.name, user.locale, status, &link).await
                {
                    tracing::error!("Failed to send booking status email to {}: {}", user.id, e);
                }
            });
        }
    }

    /// Cancels pending bookings nobody acted on within `ttl_hours`.
    pub async fn expire_stale_bookings(&self, ttl_hours: i64) -> Result<usize, ServiceError> {
        let cutoff = Utc::now() - Duration::hours(ttl_hours);
        let expired = self.db_client.expire_pending_bookings(cutoff).await?;

        for booking in &expired {
            self.notification_service
                .notify_booking_status(booking, &[booking.customer_id, booking.tasker_id])
                .await;
        }

        if !expired.is_empty() {
            tracing::info!("Expired {} pending bookings older than {}", expired.len(), cutoff);
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::taskermodel::{PricingType, ServiceCategory};

    fn service(tasker_id: Uuid, pricing_type: PricingType, price: i64) -> TaskerService {
        TaskerService {
            id: Uuid::new_v4(),
            tasker_id,
            category: ServiceCategory::Plumbing,
            title: "Leak repair".to_string(),
            description: "Kitchen and bathroom leaks".to_string(),
            pricing_type,
            price,
            city: "Rabat".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn past_and_present_slots_are_rejected() {
        let now = Utc::now();
        assert!(matches!(
            check_schedule(now - Duration::hours(1), now),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(check_schedule(now, now), Err(ServiceError::Validation(_))));
        assert!(check_schedule(now + Duration::hours(2), now).is_ok());
    }

    #[test]
    fn taskers_cannot_book_themselves() {
        let tasker_id = Uuid::new_v4();
        let svc = service(tasker_id, PricingType::Fixed, 20_000);
        match quote_booking(tasker_id, &svc, None) {
            Err(ServiceError::Validation(message)) => assert!(message.contains("own service")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn quote_follows_pricing_type() {
        let customer = Uuid::new_v4();
        let hourly = service(Uuid::new_v4(), PricingType::Hourly, 7_500);
        assert_eq!(quote_booking(customer, &hourly, Some(4)).ok(), Some(30_000));
        assert!(matches!(quote_booking(customer, &hourly, None), Err(ServiceError::Validation(_))));
        assert!(matches!(quote_booking(customer, &hourly, Some(13)), Err(ServiceError::Validation(_))));

        let fixed = service(Uuid::new_v4(), PricingType::Fixed, 20_000);
        assert_eq!(quote_booking(customer, &fixed, None).ok(), Some(20_000));
        assert!(matches!(quote_booking(customer, &fixed, Some(2)), Err(ServiceError::Validation(_))));
    }
}
