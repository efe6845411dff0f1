use crate::web::api::AppState;
use axum::{
    extract::State,
    response::{sse::Event, Sse},
};
use futures::stream::{self, Stream};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::StreamExt as _;

// Handler for background transition SSE events
pub async fn background_events(
    State(controller): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let transition_rx = controller.lock().await.subscribe();

    let stream = stream::unfold(transition_rx, |mut rx| async move {
        match rx.recv().await {
            Ok(transition) => {
                let event = match serde_json::to_string(&transition) {
                    Ok(payload) => Event::default().event("transition").data(payload),
                    Err(e) => {
                        warn!("Failed to serialize transition: {}", e);
                        Event::default().event("ping").data("")
                    }
                };
                Some((Ok(event), rx))
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!("Event stream lagged, {} transitions skipped", skipped);
                let event = Event::default().event("ping").data("");
                Some((Ok(event), rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    // Add keepalive logic
    let keepalive = stream::repeat_with(|| Event::default().event("ping").data(""))
        .map(Ok)
        .throttle(Duration::from_secs(30));

    Sse::new(stream.merge(keepalive)).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive-text"),
    )
}
