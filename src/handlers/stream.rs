// src/handlers/stream.rs
use std::sync::Arc;
use std::task::Poll;

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse};
use futures_util::stream;
use log::info;
use uuid::Uuid;

use crate::broadcast::{Broadcaster, Hub};
use crate::models::events::UpdateEvent;

/// Removes hub bookkeeping when the SSE connection goes away. Dropping with
/// the stream is the disconnect signal; the broadcast loop itself is
/// unaffected.
struct SubscriberGuard {
    hub: Arc<Hub>,
    id: Uuid,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
        info!(
            "subscriber {} disconnected ({} remaining)",
            self.id,
            self.hub.subscriber_count()
        );
    }
}

pub fn sse_frame(event: &UpdateEvent) -> String {
    format!(
        "event: {}\ndata: {}\n\n",
        event.name(),
        serde_json::to_string(event).unwrap_or_default()
    )
}

/// GET /events — subscribe to the broadcast stream. The first subscriber
/// (and, harmlessly, every later one) triggers the idempotent loop start.
pub async fn stream_events(
    hub: web::Data<Hub>,
    broadcaster: web::Data<Broadcaster>,
) -> HttpResponse {
    broadcaster.into_inner().ensure_started();

    let (id, mut rx) = hub.subscribe();
    info!(
        "subscriber {} connected ({} total)",
        id,
        hub.subscriber_count()
    );
    let guard = SubscriberGuard {
        hub: hub.into_inner(),
        id,
    };

    let stream = stream::poll_fn(move |cx: &mut std::task::Context<'_>| {
        let _connected = &guard;
        match rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Ok::<Bytes, actix_web::Error>(
                Bytes::from(sse_frame(&event)),
            ))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_carry_event_name_and_tagged_payload() {
        let event = UpdateEvent::VotesUpdate {
            server: "ark".to_string(),
            votes: 8,
        };
        let frame = sse_frame(&event);
        assert!(frame.starts_with("event: votes_update\n"));
        assert!(frame.contains(r#""event":"votes_update""#));
        assert!(frame.contains(r#""server":"ark""#));
        assert!(frame.ends_with("\n\n"));
    }
}
