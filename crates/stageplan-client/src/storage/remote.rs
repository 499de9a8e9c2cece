use chrono::{DateTime, Utc};

use super::ScheduleBackend;
use crate::api_client::ApiClient;
use crate::error::Result;
use stageplan_common::{ItemId, ItemPatch, NewItem, ScheduledItem};

/// Remote storage backend that talks to a stageplan server.
pub struct RemoteStorage {
    client: ApiClient,
}

impl RemoteStorage {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(server_url)?,
        })
    }

    /// Client for the event stream, sharing the server address
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

impl ScheduleBackend for RemoteStorage {
    fn load_items(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<ScheduledItem>> {
        self.client.get_items(from, to)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<ScheduledItem> {
        self.client.patch_item(id, patch)
    }

    fn create_item(&self, item: NewItem) -> Result<ScheduledItem> {
        item.validate()?;
        self.client.create_item(&item)
    }
}
