// service/realtime.rs
use chrono::{DateTime, Utc};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

pub const HUB_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RealtimeEventKind {
    #[serde(rename = "notification.new")]
    NotificationNew,
    #[serde(rename = "message.new")]
    MessageNew,
    #[serde(rename = "booking.status")]
    BookingStatus,
}

impl RealtimeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeEventKind::NotificationNew => "notification.new",
            RealtimeEventKind::MessageNew => "message.new",
            RealtimeEventKind::BookingStatus => "booking.status",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub recipient_id: Uuid,
    pub event: RealtimeEventKind,
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl RealtimeEvent {
    pub fn new(recipient_id: Uuid, event: RealtimeEventKind, payload: serde_json::Value) -> Self {
        Self {
            recipient_id,
            event,
            payload,
            sent_at: Utc::now(),
        }
    }
}

/// What a subscriber sees: its own events, or a note that some were dropped.
#[derive(Debug, Clone)]
pub enum StreamItem {
    Event(RealtimeEvent),
    Lagged(u64),
}

/// Process-wide fan-out of row events. Delivery is at-most-once: nothing is
/// buffered for users who are not connected.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscribers saw the event.
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        let kind = event.event.as_str();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("No realtime subscribers for {}", kind);
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stream of the events addressed to `user_id`. Dropping the stream drops
    /// the receiver, which unsubscribes.
    pub fn subscribe_user(&self, user_id: Uuid) -> impl Stream<Item = StreamItem> + Send + 'static {
        let receiver = self.sender.subscribe();

        stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.recipient_id == user_id => {
                        return Some((StreamItem::Event(event), receiver));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Realtime subscriber {} lagged by {} events", user_id, skipped);
                        return Some((StreamItem::Lagged(skipped), receiver));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(HUB_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn subscriber_only_sees_own_events() {
        let hub = RealtimeHub::new(16);
        let me = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        let stream = hub.subscribe_user(me);
        tokio::pin!(stream);

        hub.publish(RealtimeEvent::new(someone_else, RealtimeEventKind::MessageNew, serde_json::json!({"n": 1})));
        hub.publish(RealtimeEvent::new(me, RealtimeEventKind::MessageNew, serde_json::json!({"n": 2})));

        let item = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("stream should yield")
            .expect("stream should be open");

        match item {
            StreamItem::Event(event) => {
                assert_eq!(event.recipient_id, me);
                assert_eq!(event.payload["n"], 2);
            }
            StreamItem::Lagged(_) => panic!("unexpected lag"),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let hub = RealtimeHub::new(4);
        let delivered = hub.publish(RealtimeEvent::new(
            Uuid::new_v4(),
            RealtimeEventKind::NotificationNew,
            serde_json::Value::Null,
        ));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn slow_subscriber_gets_lagged_marker() {
        let hub = RealtimeHub::new(2);
        let me = Uuid::new_v4();
        let stream = hub.subscribe_user(me);
        tokio::pin!(stream);

        for n in 0..5 {
            hub.publish(RealtimeEvent::new(me, RealtimeEventKind::BookingStatus, serde_json::json!({"n": n})));
        }

        match stream.next().await {
            Some(StreamItem::Lagged(skipped)) => assert_eq!(skipped, 3),
            other => panic!("expected lag, got {:?}", other),
        }

        match stream.next().await {
            Some(StreamItem::Event(event)) => assert_eq!(event.payload["n"], 3),
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let hub = RealtimeHub::new(4);
        let stream = hub.subscribe_user(Uuid::new_v4());
        assert_eq!(hub.subscriber_count(), 1);
        drop(stream);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn event_names_serialize_dotted() {
        let json = serde_json::to_value(RealtimeEventKind::BookingStatus).unwrap();
        assert_eq!(json, "booking.status");
    }
}
