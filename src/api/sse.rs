//! Server-Sent Events support

use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: SseEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok(sse_event_to_axum(init_event)) });

    // A slow client misses events; tell it so it can refetch the session
    let broadcasts = BroadcastStream::new(broadcast_rx).map(|result| match result {
        Ok(event) => Ok(sse_event_to_axum(event)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => Ok(lagged_event(skipped)),
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn lagged_event(skipped: u64) -> Event {
    let data = json!({
        "type": "error",
        "message": format!("{skipped} events skipped, reload the session"),
    });
    Event::default().event("error").data(data.to_string())
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = match event {
        SseEvent::Init {
            session,
            messages,
            awaiting_reply,
        } => (
            "init",
            json!({
                "type": "init",
                "session": session,
                "messages": messages,
                "awaiting_reply": awaiting_reply
            }),
        ),
        SseEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SseEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        SseEvent::ReplyDone => (
            "reply_done",
            json!({
                "type": "reply_done"
            }),
        ),
        SseEvent::ConversationReset { title, description } => (
            "conversation_reset",
            json!({
                "type": "conversation_reset",
                "title": title,
                "description": description
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
