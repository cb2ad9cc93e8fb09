use std::{sync::Arc, time::Duration};

use axum::{
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures::{Stream, StreamExt};

use crate::{
    middleware::JWTAuthMiddeware,
    service::realtime::{RealtimeEvent, StreamItem},
    AppState,
};

const KEEP_ALIVE_SECS: u64 = 15;

pub fn realtime_handler() -> Router {
    Router::new().route("/stream", get(stream_events))
}

fn to_sse_event(item: StreamItem) -> Result<Event, axum::Error> {
    match item {
        StreamItem::Event(event) => realtime_event(&event),
        StreamItem::Lagged(skipped) => Event::default()
            .event("lagged")
            .json_data(serde_json::json!({ "skipped": skipped })),
    }
}

fn realtime_event(event: &RealtimeEvent) -> Result<Event, axum::Error> {
    Event::default()
        .event(event.event.as_str())
        .json_data(event)
}

/// Streams the caller's events until the client disconnects, which drops the subscription.
pub async fn stream_events(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(
        "Realtime stream opened for {} ({} subscribers)",
        user.user.id,
        app_state.realtime.subscriber_count() + 1
    );

    let stream = app_state.realtime.subscribe_user(user.user.id).map(to_sse_event);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::realtime::{RealtimeEventKind, RealtimeHub};
    use uuid::Uuid;

    #[tokio::test]
    async fn hub_events_become_sse_events() {
        let hub = RealtimeHub::default();
        let user_id = Uuid::new_v4();
        let mut stream = Box::pin(hub.subscribe_user(user_id).map(to_sse_event));

        hub.publish(RealtimeEvent::new(
            user_id,
            RealtimeEventKind::BookingStatus,
            serde_json::json!({ "status": "accepted" }),
        ));

        let event = stream.next().await.unwrap();
        assert!(event.is_ok());
    }

    #[test]
    fn lagged_marker_is_an_event() {
        assert!(to_sse_event(StreamItem::Lagged(3)).is_ok());
    }
}
