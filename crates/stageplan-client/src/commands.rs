use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Result, StageplanError};
use crate::planner::Planner;
use crate::render::Render;
use crate::timeline::{compute_layout, Resolution, TimeWindow};
use stageplan_common::NewItem;

/// Print the packed layout of `[from, from + days)`.
pub fn layout(
    data_dir: Option<&Path>,
    from: Option<DateTime<Utc>>,
    days: Option<u32>,
    resolution: Option<Resolution>,
) -> Result<()> {
    let planner = Planner::new(data_dir)?;
    let settings = &planner.config.timeline;

    let resolution = resolution.unwrap_or(settings.resolution);
    let now = Utc::now();
    let start = from.unwrap_or_else(|| resolution.floor(now));
    let days = days.unwrap_or(settings.span_days).max(1);
    let end = start + Duration::days(i64::from(days));
    let window = TimeWindow::new(start, end, resolution, settings.zoom)?;

    let items = planner.backend().load_items(window.start, window.end)?;
    tracing::info!(count = items.len(), %start, %end, "printing layout");
    let layout = compute_layout(&items, &window, now)?;

    Render::new(settings.cell_width_px).display_layout(&layout, &items);
    Ok(())
}

/// Create an item and report its id.
pub fn add(
    data_dir: Option<&Path>,
    group: String,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<()> {
    let planner = Planner::new(data_dir)?;
    let item = planner.backend().create_item(NewItem {
        group_key: group,
        title,
        start,
        end,
    })?;
    tracing::info!(id = item.id, "item created");

    Render::new(planner.config.timeline.cell_width_px).item_created(&item);
    Ok(())
}

/// Parse an instant given as RFC 3339, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD`
/// (the latter two read as UTC).
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(t.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(t) = date.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    Err(StageplanError::General(format!(
        "invalid date/time '{input}' (expected e.g. 2026-03-14 or 2026-03-14T09:30)"
    )))
}

pub fn parse_resolution(input: &str) -> Result<Resolution> {
    match input.trim().to_lowercase().as_str() {
        "hour" | "hours" | "h" => Ok(Resolution::Hour),
        "day" | "days" | "d" => Ok(Resolution::Day),
        "week" | "weeks" | "w" => Ok(Resolution::Week),
        "month" | "months" | "m" => Ok(Resolution::Month),
        other => Err(StageplanError::General(format!(
            "unknown resolution '{other}' (hour, day, week, month)"
        ))),
    }
}
