use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};
use crate::group;

pub type ItemId = u64;

/// A schedulable entry on the timeline (a load-in, a crew shift, a truck
/// booking, ...).
///
/// Intervals are half-open: an item occupies `[start, end)`. Zero-length
/// items are allowed and never overlap anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    pub id: ItemId,

    #[serde(deserialize_with = "group::deserialize_group_key")]
    pub group_key: String,

    pub title: String,

    pub start: DateTime<Utc>,

    pub end: DateTime<Utc>,
}

impl ScheduledItem {
    pub fn new(
        id: ItemId,
        group_key: &str,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CommonResult<Self> {
        validate_interval(start, end)?;
        Ok(Self {
            id,
            group_key: group::normalize_group_key(group_key),
            title: title.into(),
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether the item is visible in the half-open window `[from, to)`.
    ///
    /// Zero-length items count as visible when their instant lies inside the
    /// window.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        if self.start == self.end {
            return self.start >= from && self.start < to;
        }
        self.start < to && self.end > from
    }

    /// Copy of this item with its interval replaced.
    pub fn with_interval(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}

pub(crate) fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> CommonResult<()> {
    if start > end {
        return Err(CommonError::InvalidInterval { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, 0, 0).unwrap()
    }

    #[test]
    fn test_new_normalizes_group_key() {
        let item = ScheduledItem::new(1, " #Audio ", "Soundcheck", at(10), at(11)).unwrap();
        assert_eq!(item.group_key, "Audio");
    }

    #[test]
    fn test_new_rejects_inverted_interval() {
        let err = ScheduledItem::new(1, "audio", "Soundcheck", at(12), at(11)).unwrap_err();
        assert!(matches!(err, CommonError::InvalidInterval { .. }));
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let item = ScheduledItem::new(1, "audio", "Soundcheck", at(10), at(12)).unwrap();
        assert!(item.overlaps(at(11), at(13)));
        assert!(!item.overlaps(at(12), at(14)));
        assert!(!item.overlaps(at(8), at(10)));
    }

    #[test]
    fn test_zero_length_item_visible_only_inside_window() {
        let item = ScheduledItem::new(1, "audio", "Doors", at(10), at(10)).unwrap();
        assert!(item.overlaps(at(10), at(11)));
        assert!(!item.overlaps(at(9), at(10)));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let item = ScheduledItem::new(7, "rigging", "Truss up", at(9), at(13)).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["groupKey"], "rigging");
        assert_eq!(json["start"], "2026-03-14T09:00:00Z");

        let back: ScheduledItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
