use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ScheduledItem;

/// Name of the server-sent event emitted whenever stored items change.
pub const DATA_CHANGED_EVENT: &str = "data_changed";

/// Query string for GET /api/v1/items
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Response from GET /api/v1/items
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<ScheduledItem>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response from GET /api/v1/health
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
