use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use stageplan_common::api::{ItemsQuery, ItemsResponse};
use stageplan_common::{group, ItemId, ItemPatch, NewItem, ScheduledItem};

use crate::db::{into_items, ItemRow};
use crate::error::{Result, ServerError};
use crate::router::{AppState, SyncEvent};

/// Longest range a single query may cover
const MAX_QUERY_DAYS: i64 = 3 * 366;

const TITLE_MAX_CHARS: usize = 200;

fn validate_query(query: &ItemsQuery) -> Result<()> {
    if query.start >= query.end {
        return Err(ServerError::Validation(
            "start must be before end".to_string(),
        ));
    }
    if query.end - query.start > chrono::Duration::days(MAX_QUERY_DAYS) {
        return Err(ServerError::Validation(format!(
            "range must be at most {MAX_QUERY_DAYS} days"
        )));
    }
    Ok(())
}

fn validate_new_item(item: &NewItem) -> Result<()> {
    item.validate()?;
    if item.title.chars().count() > TITLE_MAX_CHARS {
        return Err(ServerError::Validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn row_id(id: ItemId) -> Result<i64> {
    i64::try_from(id).map_err(|_| ServerError::NotFound(id))
}

/// Items overlapping `[start, end)`, ordered by start then id.
#[tracing::instrument(skip(state))]
pub async fn get_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ItemsResponse>> {
    validate_query(&query)?;

    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, group_key, title, start_at, end_at FROM scheduled_items \
         WHERE (start_at < $2 AND end_at > $1) \
            OR (start_at = end_at AND start_at >= $1 AND start_at < $2) \
         ORDER BY start_at, id",
    )
    .bind(query.start)
    .bind(query.end)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ItemsResponse {
        items: into_items(rows)?,
    }))
}

#[tracing::instrument(skip(state, item), fields(group = %item.group_key))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<NewItem>,
) -> Result<(StatusCode, Json<ScheduledItem>)> {
    validate_new_item(&item)?;

    let row = sqlx::query_as::<_, ItemRow>(
        "INSERT INTO scheduled_items (group_key, title, start_at, end_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, group_key, title, start_at, end_at",
    )
    .bind(group::normalize_group_key(&item.group_key))
    .bind(item.title.trim())
    .bind(item.start)
    .bind(item.end)
    .fetch_one(&state.pool)
    .await?;

    let created = ScheduledItem::try_from(row)?;
    tracing::info!(id = created.id, "item created");
    state
        .notifications
        .notify(SyncEvent::ItemChanged(created.id));
    Ok((StatusCode::CREATED, Json(created)))
}

/// Reschedule one item. The merged interval is validated under a row lock
/// so concurrent patches to the two bounds cannot cross them.
#[tracing::instrument(skip(state))]
pub async fn patch_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<ScheduledItem>> {
    let key = row_id(id)?;
    let mut tx = state.pool.begin().await?;

    let current = sqlx::query_as::<_, ItemRow>(
        "SELECT id, group_key, title, start_at, end_at FROM scheduled_items \
         WHERE id = $1 FOR UPDATE",
    )
    .bind(key)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(ServerError::NotFound(id))?;

    let updated = patch.apply(&ScheduledItem::try_from(current)?)?;

    sqlx::query(
        "UPDATE scheduled_items SET start_at = $2, end_at = $3, updated_at = now() \
         WHERE id = $1",
    )
    .bind(key)
    .bind(updated.start)
    .bind(updated.end)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(id, start = %updated.start, end = %updated.end, "item rescheduled");
    state.notifications.notify(SyncEvent::ItemChanged(id));
    Ok(Json(updated))
}
