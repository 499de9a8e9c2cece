use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use opentelemetry::metrics::UpDownCounter;
use opentelemetry::{global, KeyValue};
use stageplan_common::api::DATA_CHANGED_EVENT;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::router::{AppState, SyncEvent};

/// Decrements the SSE active-connections counter on drop.
struct SseConnectionGuard {
    counter: UpDownCounter<i64>,
}

impl SseConnectionGuard {
    fn new() -> Self {
        let meter = global::meter("stageplan-server");
        let counter = meter
            .i64_up_down_counter("sse.active_connections")
            .with_description("Number of active SSE connections")
            .build();
        counter.add(1, &[KeyValue::new("endpoint", "/api/v1/events")]);
        Self { counter }
    }
}

impl Drop for SseConnectionGuard {
    fn drop(&mut self) {
        self.counter
            .add(-1, &[KeyValue::new("endpoint", "/api/v1/events")]);
    }
}

/// Stream wrapper holding a [`SseConnectionGuard`] for as long as the
/// client stays connected.
struct TrackedStream<S> {
    inner: S,
    _guard: SseConnectionGuard,
}

impl<S> Stream for TrackedStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// SSE payload for one broadcast result. A lagged receiver missed some
/// changes, so it is told that everything may have changed.
fn to_event(result: Result<SyncEvent, BroadcastStreamRecvError>) -> Event {
    let data = match result {
        Ok(SyncEvent::ItemChanged(id)) => id.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "event subscriber lagged");
            "items".to_string()
        }
    };
    Event::default().event(DATA_CHANGED_EVENT).data(data)
}

/// SSE endpoint streaming a `data_changed` event for every item change.
#[tracing::instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifications.subscribe();
    let stream = BroadcastStream::new(rx).map(|result| Ok(to_event(result)));

    let tracked = TrackedStream {
        inner: stream,
        _guard: SseConnectionGuard::new(),
    };

    Sse::new(tracked).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
