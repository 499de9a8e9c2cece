use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::directory::resolve_data_directory;
use crate::error::Result;
use crate::storage::{LocalStorage, RemoteStorage, ScheduleBackend};

/// Resolved runtime context shared by the CLI commands and the TUI: the
/// configuration, the data directory and the backend items live in.
pub struct Planner {
    pub config: Config,
    pub data_dir: PathBuf,
    backend: Arc<dyn ScheduleBackend>,
    events: Option<ApiClient>,
}

impl Planner {
    pub fn new(cli_data_dir: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default();
        let data_dir = resolve_data_directory(cli_data_dir, &config)?;

        let (backend, events): (Arc<dyn ScheduleBackend>, Option<ApiClient>) =
            if config.sync.enabled {
                let remote = RemoteStorage::new(&config.sync.server_url)?;
                let events = remote.client().clone();
                (Arc::new(remote), Some(events))
            } else {
                (Arc::new(LocalStorage::new(&data_dir)?), None)
            };

        Ok(Self {
            config,
            data_dir,
            backend,
            events,
        })
    }

    pub fn backend(&self) -> Arc<dyn ScheduleBackend> {
        Arc::clone(&self.backend)
    }

    /// Event stream source; only remote backends push changes.
    pub fn events(&self) -> Option<&ApiClient> {
        self.events.as_ref()
    }

    /// Where items are stored, for display
    pub fn location(&self) -> String {
        if self.config.sync.enabled {
            self.config.sync.server_url.clone()
        } else {
            self.data_dir.join("storage").display().to_string()
        }
    }
}
