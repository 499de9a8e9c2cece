use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use uuid::Uuid;

use crate::error::{Result, StageplanError};
use stageplan_common::{ItemId, ItemPatch, NewItem, ScheduledItem};

use super::ScheduleBackend;

/// Local file-based storage with atomic writes.
///
/// Read-modify-write cycles hold an exclusive lock on a sidecar file so a
/// CLI invocation and a running TUI cannot interleave their updates.
pub struct LocalStorage {
    main_app_dir: PathBuf,
    storage_dir: PathBuf,
    temp_dir: PathBuf,
    storage_file: PathBuf,
    lock_file: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let main_app_dir = data_dir.to_path_buf();
        let storage_dir = main_app_dir.join("storage");
        let temp_dir = main_app_dir.join(".temp");
        let storage_file = storage_dir.join("schedule.json");
        let lock_file = storage_dir.join("schedule.lock");

        let storage = Self {
            main_app_dir,
            storage_dir,
            temp_dir,
            storage_file,
            lock_file,
        };

        storage.ensure_directories()?;

        Ok(storage)
    }

    fn ensure_directories(&self) -> Result<()> {
        if !self.main_app_dir.exists() {
            fs::create_dir_all(&self.main_app_dir)?;
        }
        if !self.storage_dir.exists() {
            fs::create_dir(&self.storage_dir)?;
        }
        if !self.temp_dir.exists() {
            fs::create_dir(&self.temp_dir)?;
        }

        self.clean_temp_dir()?;

        Ok(())
    }

    fn clean_temp_dir(&self) -> Result<()> {
        for entry in fs::read_dir(&self.temp_dir)? {
            let entry = entry?;
            fs::remove_file(entry.path())?;
        }
        Ok(())
    }

    fn get_temp_file(&self) -> PathBuf {
        let random_string = &Uuid::new_v4().to_string()[..8];
        self.temp_dir
            .join(format!("schedule.TEMP-{random_string}.json"))
    }

    fn read_all(&self) -> Result<Vec<ScheduledItem>> {
        if !self.storage_file.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.storage_file)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, items: &[ScheduledItem]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        let temp_file = self.get_temp_file();

        fs::write(&temp_file, json)?;
        fs::rename(&temp_file, &self.storage_file)?;

        Ok(())
    }

    /// Run `f` while holding the storage lock. The lock is released when the
    /// lock file handle is dropped.
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock: File = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)?;
        lock.lock_exclusive()?;
        f()
    }
}

impl ScheduleBackend for LocalStorage {
    fn load_items(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ScheduledItem>> {
        let mut items: Vec<ScheduledItem> = self
            .read_all()?
            .into_iter()
            .filter(|item| item.overlaps(from, to))
            .collect();
        items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<ScheduledItem> {
        self.locked(|| {
            let mut items = self.read_all()?;
            let item = items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or(StageplanError::NotFound(id))?;
            *item = patch.apply(item)?;
            let updated = item.clone();
            self.write_all(&items)?;
            tracing::debug!(id, "item updated in local storage");
            Ok(updated)
        })
    }

    fn create_item(&self, item: NewItem) -> Result<ScheduledItem> {
        self.locked(|| {
            let mut items = self.read_all()?;
            let id = items.iter().map(|item| item.id).max().unwrap_or(0) + 1;
            let created = item.into_item(id)?;
            items.push(created.clone());
            self.write_all(&items)?;
            tracing::debug!(id, "item created in local storage");
            Ok(created)
        })
    }
}
