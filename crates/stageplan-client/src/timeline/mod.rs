//! Timeline layout and interactive scheduling engine.
//!
//! Everything in here is toolkit independent: positions are `f64` pixels
//! measured from the left edge of the visible window, and instants are UTC.
//! The TUI maps terminal cells onto this pixel space.

mod axis;
mod drag;
mod lanes;
mod layout;
mod scheduler;
#[cfg(test)]
pub(crate) mod test_support;
mod viewport;
mod window;

pub use axis::{AxisDelta, Span, Tick, TimeAxis};
pub use drag::{
    CommitRequest, DragController, DragMode, DragOutcome, DragPhase, DragSession, DragState,
    PendingEdit, CLICK_SLOP_PX, EDGE_HANDLE_PX,
};
pub use lanes::{assign_lanes, group_items, peak_concurrency, Group, Lane};
pub use layout::{compute_layout, merge_overlay, GroupLayout, ItemRect, Layout, LayoutRow, Overlay};
pub use scheduler::{execute, CommitReport, Completion, Effect, Notice, PointerRelease, Scheduler};
pub use viewport::{PanDirection, ViewportController, ZoomDirection, PAN_STEP_FAST_PX, PAN_STEP_PX};
pub use window::{Resolution, TimeWindow, ZoomLevel, ZOOM_STEPS};

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Invalid time window: start {start} is not before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unknown item: {0}")]
    UnknownItem(u64),
}

pub type TimelineResult<T> = std::result::Result<T, TimelineError>;
