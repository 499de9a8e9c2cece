mod local;
mod remote;

pub use local::LocalStorage;
pub use remote::RemoteStorage;

use chrono::{DateTime, Utc};

use crate::error::Result;
use stageplan_common::{ItemId, ItemPatch, NewItem, ScheduledItem};

/// Trait abstracting where scheduled items live (local file, remote server).
///
/// Calls block; the TUI runs them on worker threads.
pub trait ScheduleBackend: Send + Sync {
    /// Items overlapping `[from, to)`, ordered by start then id.
    fn load_items(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ScheduledItem>>;

    /// Apply `patch` to one item and return the stored result.
    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<ScheduledItem>;

    fn create_item(&self, item: NewItem) -> Result<ScheduledItem>;
}
