mod item;
mod patch;

pub use item::{ItemId, ScheduledItem};
pub use patch::{ItemPatch, NewItem};
