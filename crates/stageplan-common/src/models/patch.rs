use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{validate_interval, ScheduledItem};
use crate::error::{CommonError, CommonResult};
use crate::group;

/// Partial interval update. Only the bounds that changed are populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl ItemPatch {
    /// Build the patch that turns `(old_start, old_end)` into
    /// `(new_start, new_end)`, leaving unchanged bounds out.
    pub fn between(
        old: (DateTime<Utc>, DateTime<Utc>),
        new: (DateTime<Utc>, DateTime<Utc>),
    ) -> Self {
        Self {
            start: (old.0 != new.0).then_some(new.0),
            end: (old.1 != new.1).then_some(new.1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Apply the patch to `item`, validating the merged interval.
    pub fn apply(&self, item: &ScheduledItem) -> CommonResult<ScheduledItem> {
        let start = self.start.unwrap_or(item.start);
        let end = self.end.unwrap_or(item.end);
        validate_interval(start, end)?;
        Ok(item.with_interval(start, end))
    }
}

/// Payload for creating a new item; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub group_key: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NewItem {
    pub fn validate(&self) -> CommonResult<()> {
        if self.title.trim().is_empty() {
            return Err(CommonError::EmptyTitle);
        }
        validate_interval(self.start, self.end)
    }

    pub fn into_item(self, id: u64) -> CommonResult<ScheduledItem> {
        self.validate()?;
        Ok(ScheduledItem {
            id,
            group_key: group::normalize_group_key(&self.group_key),
            title: self.title.trim().to_string(),
            start: self.start,
            end: self.end,
        })
    }
}
