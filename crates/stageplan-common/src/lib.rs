pub mod api;
pub mod error;
pub mod group;
pub mod models;

pub use error::{CommonError, CommonResult};
pub use models::{ItemId, ItemPatch, NewItem, ScheduledItem};
