use thiserror::Error;

use crate::timeline::TimelineError;
use stageplan_common::CommonError;

#[derive(Error, Debug)]
pub enum StageplanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid custom directory: {0}")]
    InvalidDirectory(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Item not found: {0}")]
    NotFound(u64),

    #[error("Edit rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error("TUI error: {0}")]
    Tui(String),

    #[error("{0}")]
    General(String),
}

impl From<CommonError> for StageplanError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Json(e) => StageplanError::Json(e),
            other => StageplanError::Rejected(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StageplanError>;
