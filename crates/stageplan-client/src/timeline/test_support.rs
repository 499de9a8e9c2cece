use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use stageplan_common::{ItemId, ItemPatch, NewItem, ScheduledItem};

use crate::error::{Result, StageplanError};
use crate::storage::ScheduleBackend;

/// In-memory backend that can be told to reject updates or fail loads.
#[derive(Default)]
pub struct FakeBackend {
    items: Mutex<Vec<ScheduledItem>>,
    reject_updates: AtomicBool,
    fail_loads: AtomicBool,
    loads: AtomicUsize,
}

impl FakeBackend {
    pub fn with_items(items: Vec<ScheduledItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn item(&self, id: ItemId) -> Option<ScheduledItem> {
        self.items.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }
}

impl ScheduleBackend for FakeBackend {
    fn load_items(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ScheduledItem>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StageplanError::Network("connection refused".into()));
        }
        let items = self.items.lock().unwrap();
        Ok(items.iter().filter(|i| i.overlaps(from, to)).cloned().collect())
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<ScheduledItem> {
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(StageplanError::Network("server unavailable".into()));
        }
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StageplanError::NotFound(id))?;
        *item = patch.apply(item)?;
        Ok(item.clone())
    }

    fn create_item(&self, item: NewItem) -> Result<ScheduledItem> {
        let mut items = self.items.lock().unwrap();
        let id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let created = ScheduledItem::new(id, &item.group_key, &item.title, item.start, item.end)?;
        items.push(created.clone());
        Ok(created)
    }
}
