use axum::http::HeaderValue;
use axum::routing::{get, patch};
use axum::Router;
use sqlx::PgPool;
use stageplan_common::ItemId;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{events, health, items};
use crate::metrics_middleware::HttpMetricsLayer;

/// Event broadcast to connected SSE clients when data changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// An item was created or rescheduled.
    ItemChanged(ItemId),
}

/// Broadcast hub for real-time sync notifications. Every subscriber sees
/// every change.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<SyncEvent>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self {
            sender: broadcast::channel(64).0,
        }
    }
}

impl NotificationHub {
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Send a notification to all connected clients.
    pub fn notify(&self, event: SyncEvent) {
        // Ignore send errors: they just mean no receivers are connected.
        let _ = self.sender.send(event);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub notifications: NotificationHub,
}

pub fn build(pool: PgPool, cors_origins: &[String]) -> Router {
    let state = AppState {
        pool,
        notifications: NotificationHub::default(),
    };

    let cors = build_cors_layer(cors_origins);

    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/api/v1/items", get(items::get_items).post(items::create_item))
        .route("/api/v1/items/:id", patch(items::patch_item))
        .route("/api/v1/events", get(events::events))
        // Items are small; 1 MB is plenty
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .layer(cors)
        .layer(HttpMetricsLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if origins.is_empty() {
        // No SP_CORS_ORIGINS configured: only local browser development is
        // allowed.
        cors.allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://localhost",
        )))
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(AllowOrigin::list(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_fans_out_to_every_subscriber() {
        let hub = NotificationHub::default();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.notify(SyncEvent::ItemChanged(3));
        assert_eq!(first.try_recv().unwrap(), SyncEvent::ItemChanged(3));
        assert_eq!(second.try_recv().unwrap(), SyncEvent::ItemChanged(3));
    }

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        let hub = NotificationHub::default();
        hub.notify(SyncEvent::ItemChanged(1));
        let mut late = hub.subscribe();
        assert!(late.try_recv().is_err());
    }
}
