use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use futures::stream::Stream;
use smartcenter_shared::{INITIAL_STATUS_EVENT, STATUS_UPDATE_EVENT};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::config::SSE_KEEPALIVE_SECS;
use crate::state::AppState;

/// Push channel for viewers: the full status map first, then every accepted
/// update. A subscriber that falls behind the broadcast buffer gets a fresh
/// full map instead of the updates it missed.
pub async fn status_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        // Subscribe before reading the map so no update can fall in between.
        let rx = state.event_tx.subscribe();
        debug!(subscribers = state.event_tx.receiver_count(), "status subscriber joined");

        if let Some(event) = initial_status_event(&state).await {
            yield Ok(event);
        }

        let mut stream = BroadcastStream::new(rx);
        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => {
                    let Ok(payload) = std::str::from_utf8(event.json.as_ref()) else {
                        warn!(seq = event.seq, "status payload is not valid utf-8; dropping SSE event");
                        continue;
                    };
                    yield Ok(
                        Event::default()
                            .id(event.seq.to_string())
                            .event(STATUS_UPDATE_EVENT)
                            .data(payload),
                    );
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(
                        skipped_events = skipped,
                        "SSE client lagged behind broadcast buffer; replaying full status"
                    );
                    state.observability.record_lagged_events(skipped);
                    if let Some(event) = initial_status_event(&state).await {
                        yield Ok(event);
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keep-alive"),
    )
}

async fn initial_status_event(state: &AppState) -> Option<Event> {
    let map = state.status_map().await;
    let seq = state
        .next_seq
        .load(std::sync::atomic::Ordering::Relaxed);
    match serde_json::to_string(&map) {
        Ok(payload) => Some(
            Event::default()
                .id(seq.to_string())
                .event(INITIAL_STATUS_EVENT)
                .data(payload),
        ),
        Err(e) => {
            warn!(error = %e, "failed to encode status map; skipping initial_status event");
            None
        }
    }
}
