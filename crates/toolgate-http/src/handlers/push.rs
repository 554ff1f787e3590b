//! Server-push event stream and its side-channel
//!
//! `GET /sse` opens a stream that announces the connection and then emits a
//! heartbeat every `heartbeat_interval` until the client goes away.
//! `POST /messages` acknowledges arbitrary JSON payloads; they are logged and
//! not routed to the dispatcher.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::{
        Json,
        sse::{Event, Sse},
    },
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::HttpError;
use crate::server::AppState;

pub const CONNECTED_MESSAGE: &str = "Connected to toolgate event stream";
pub const RECEIVED_MESSAGE: &str = "Message received";

/// Events sent on the push stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushEvent {
    Connected { message: String },
    Heartbeat,
}

impl PushEvent {
    fn to_sse(&self) -> Event {
        match Event::default().json_data(self) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Failed to encode push event");
                Event::default().comment("unencodable event")
            }
        }
    }
}

/// Logs when the client side of a stream is dropped.
struct ConnectionGuard {
    id: Uuid,
    opened: Instant,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        info!(
            connection_id = %self.id,
            duration_secs = self.opened.elapsed().as_secs(),
            "Event stream closed"
        );
    }
}

/// Resolves once shutdown is signalled; never resolves if the server that
/// owns the signal is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// GET /sse - Open the push stream
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let interval = state.heartbeat_interval;
    let mut shutdown = state.shutdown.clone();
    let guard = ConnectionGuard {
        id: Uuid::new_v4(),
        opened: Instant::now(),
    };
    info!(
        connection_id = %guard.id,
        heartbeat = %humantime::format_duration(interval),
        "Event stream opened"
    );

    let stream = async_stream::stream! {
        let guard = guard;
        yield Ok(PushEvent::Connected { message: CONNECTED_MESSAGE.to_string() }.to_sse());

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let stopping = tokio::select! {
                _ = ticker.tick() => false,
                _ = stopped(&mut shutdown) => true,
            };
            if stopping {
                debug!(connection_id = %guard.id, "Server shutting down, ending stream");
                break;
            }
            debug!(connection_id = %guard.id, "Sending heartbeat");
            yield Ok(PushEvent::Heartbeat.to_sse());
        }
    };

    Sse::new(stream)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub status: String,
    pub message: String,
}

/// POST /messages - Accept a side-channel message
pub async fn receive_message(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Acknowledgement>, HttpError> {
    let Json(message) = payload?;
    info!(payload = %message, "Side-channel message received");

    Ok(Json(Acknowledgement {
        status: "received".to_string(),
        message: RECEIVED_MESSAGE.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_event_wire_shape() {
        assert_eq!(
            serde_json::to_value(PushEvent::Heartbeat).unwrap(),
            json!({"type": "heartbeat"})
        );
        assert_eq!(
            serde_json::to_value(PushEvent::Connected {
                message: "hi".into()
            })
            .unwrap(),
            json!({"type": "connected", "message": "hi"})
        );
    }
}
