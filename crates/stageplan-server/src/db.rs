use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use stageplan_common::ScheduledItem;

use crate::error::{Result, ServerError};

/// Create a PostgreSQL connection pool with resilience settings.
///
/// Disables `extra_float_digits` startup parameter for PgBouncer compatibility.
pub async fn create_pool(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    let connect_options: PgConnectOptions = database_url
        .parse::<PgConnectOptions>()?
        .extra_float_digits(None);

    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(connect_options)
        .await
}

/// One row of `scheduled_items`.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub group_key: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for ScheduledItem {
    type Error = ServerError;

    fn try_from(row: ItemRow) -> Result<Self> {
        let id = u64::try_from(row.id)
            .map_err(|_| ServerError::Internal(format!("negative item id {}", row.id)))?;
        Ok(ScheduledItem::new(
            id,
            &row.group_key,
            row.title,
            row.start_at,
            row.end_at,
        )?)
    }
}

pub fn into_items(rows: Vec<ItemRow>) -> Result<Vec<ScheduledItem>> {
    rows.into_iter().map(ScheduledItem::try_from).collect()
}
