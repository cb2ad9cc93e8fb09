// service/notification_service.rs
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::{
        bookingmodel::{Booking, BookingStatus},
        chatmodels::Message,
        jobmodel::{Job, JobApplication},
        notificationmodel::{Notification, NotificationKind},
        walletmodels::RequestStatus,
    },
    service::realtime::{RealtimeEvent, RealtimeEventKind, RealtimeHub},
    utils::{currency::format_amount, locale::Locale},
};

/// Stores in-app notifications and pushes them to connected clients.
///
/// Every method here is best effort: a failure is logged and the caller's
/// operation carries on.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
    realtime: RealtimeHub,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>, realtime: RealtimeHub) -> Self {
        Self { db_client, realtime }
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Option<Notification> {
        let title = title.into();
        let body = body.into();

        match self
            .db_client
            .create_notification(user_id, kind, &title, &body, data)
            .await
        {
            Ok(notification) => {
                let payload = serde_json::to_value(&notification).unwrap_or(serde_json::Value::Null);
                self.realtime.publish(RealtimeEvent::new(
                    user_id,
                    RealtimeEventKind::NotificationNew,
                    payload,
                ));
                Some(notification)
            }
            Err(e) => {
                tracing::error!("Failed to store notification for user {}: {:?}", user_id, e);
                None
            }
        }
    }

    pub async fn notify_booking_created(&self, booking: &Booking, service_title: &str) {
        tracing::info!("Booking {} created for tasker {}", booking.id, booking.tasker_id);

        self.notify(
            booking.tasker_id,
            NotificationKind::BookingCreated,
            "New booking request",
            format!(
                "You have a new booking request for \"{}\" on {}",
                service_title,
                booking.scheduled_at.format("%Y-%m-%d %H:%M")
            ),
            Some(json!({
                "booking_id": booking.id,
                "service_id": booking.service_id,
                "total_amount": booking.total_amount,
            })),
        )
        .await;
    }

    pub async fn notify_booking_status(&self, booking: &Booking, recipients: &[Uuid]) {
        let status = booking.status.to_str();

        for recipient in recipients {
            self.notify(
                *recipient,
                NotificationKind::BookingStatusChanged,
                "Booking updated",
                format!("Booking status changed to {}", status.replace('_', " ")),
                Some(json!({
                    "booking_id": booking.id,
                    "status": status,
                })),
            )
            .await;

            self.realtime.publish(RealtimeEvent::new(
                *recipient,
                RealtimeEventKind::BookingStatus,
                json!({
                    "booking_id": booking.id,
                    "status": status,
                    "updated_at": booking.updated_at,
                }),
            ));
        }
    }

    pub async fn notify_job_application(&self, job: &Job, application: &JobApplication) {
        self.notify(
            job.customer_id,
            NotificationKind::JobApplication,
            "New application",
            format!("A tasker applied to \"{}\"", job.title),
            Some(json!({
                "job_id": job.id,
                "application_id": application.id,
                "proposed_price": application.proposed_price,
            })),
        )
        .await;
    }

    pub async fn notify_application_accepted(
        &self,
        job: &Job,
        application: &JobApplication,
        conversation_id: Option<Uuid>,
    ) {
        self.notify(
            application.tasker_id,
            NotificationKind::ApplicationAccepted,
            "Application accepted",
            format!("Your application for \"{}\" was accepted", job.title),
            Some(json!({
                "job_id": job.id,
                "application_id": application.id,
                "conversation_id": conversation_id,
            })),
        )
        .await;
    }

    pub async fn notify_new_message(&self, recipient_id: Uuid, sender_name: &str, message: &Message) {
        self.realtime.publish(RealtimeEvent::new(
            recipient_id,
            RealtimeEventKind::MessageNew,
            serde_json::to_value(message).unwrap_or(serde_json::Value::Null),
        ));

        let preview: String = message.content.chars().take(80).collect();
        self.notify(
            recipient_id,
            NotificationKind::NewMessage,
            format!("New message from {}", sender_name),
            preview,
            Some(json!({
                "conversation_id": message.conversation_id,
                "message_id": message.id,
            })),
        )
        .await;
    }

    pub async fn notify_wallet_credited(&self, user_id: Uuid, amount: i64, locale: Locale) {
        self.notify(
            user_id,
            NotificationKind::WalletCredited,
            "Wallet credited",
            format!("{} was added to your wallet", format_amount(amount, locale)),
            Some(json!({ "amount": amount })),
        )
        .await;
    }

    pub async fn notify_topup_reviewed(&self, user_id: Uuid, request_id: Uuid, status: RequestStatus, amount: i64) {
        self.notify(
            user_id,
            NotificationKind::TopupUpdate,
            "Top-up request reviewed",
            format!("Your top-up request was {}", status.to_str()),
            Some(json!({
                "topup_request_id": request_id,
                "status": status.to_str(),
                "amount": amount,
            })),
        )
        .await;
    }

    pub async fn notify_refund_reviewed(&self, user_id: Uuid, request_id: Uuid, status: RequestStatus, amount: i64) {
        self.notify(
            user_id,
            NotificationKind::RefundUpdate,
            "Refund request reviewed",
            format!("Your refund request was {}", status.to_str()),
            Some(json!({
                "refund_request_id": request_id,
                "status": status.to_str(),
                "amount": amount,
            })),
        )
        .await;
    }

    pub async fn notify_verification_reviewed(&self, user_id: Uuid, approved: bool, note: Option<&str>) {
        let outcome = if approved { "approved" } else { "rejected" };
        self.notify(
            user_id,
            NotificationKind::VerificationUpdate,
            "Identity verification",
            format!("Your identity verification was {}", outcome),
            Some(json!({ "approved": approved, "note": note })),
        )
        .await;
    }

    pub async fn notify_review_received(&self, tasker_id: Uuid, booking_id: Uuid, rating: i32) {
        self.notify(
            tasker_id,
            NotificationKind::ReviewReceived,
            "New review",
            format!("A customer rated you {}/5", rating),
            Some(json!({ "booking_id": booking_id, "rating": rating })),
        )
        .await;
    }

    pub async fn notify_booking_disputed(&self, admin_ids: &[Uuid], booking: &Booking) {
        if booking.status != BookingStatus::Disputed {
            return;
        }
        for admin in admin_ids {
            self.notify(
                *admin,
                NotificationKind::System,
                "Booking disputed",
                format!("Booking {} needs a decision", booking.id),
                Some(json!({ "booking_id": booking.id })),
            )
            .await;
        }
    }
}
