//! Centralized group key handling.
//!
//! Group keys (crew, stage, equipment pool, ...) are stored **without** the
//! `#` prefix. The `#` is added back only at the display layer via
//! [`display_name`].

/// Group used for items that were saved without a category.
pub const DEFAULT_GROUP: &str = "Unassigned";

/// Normalize a raw group key to its canonical stored form.
///
/// - Strips leading `#`
/// - Trims whitespace
/// - Maps empty input (and the alias `unassigned`) to [`DEFAULT_GROUP`]
pub fn normalize_group_key(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DEFAULT_GROUP) {
        DEFAULT_GROUP.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Case-insensitive group comparison.
pub fn group_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Key used to order groups on screen.
///
/// The default group always sorts last; everything else is ordered
/// case-insensitively, with the raw key as a tie-break so the order is total.
pub fn sort_key(key: &str) -> (bool, String, String) {
    (
        group_eq(key, DEFAULT_GROUP),
        key.to_lowercase(),
        key.to_string(),
    )
}

/// Format a group key for display.
pub fn display_name(key: &str) -> String {
    if group_eq(key, DEFAULT_GROUP) {
        DEFAULT_GROUP.to_string()
    } else {
        format!("#{}", key)
    }
}

/// Deserialize a group key, normalizing it.
///
/// Used as `#[serde(deserialize_with = "...")]` on `ScheduledItem::group_key`
/// so hand-edited storage files with `#crew` or blank keys load cleanly.
pub fn deserialize_group_key<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw = String::deserialize(deserializer)?;
    Ok(normalize_group_key(&raw))
}
