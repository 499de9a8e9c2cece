use chrono::{DateTime, Duration, Months, Utc};

use super::axis::{AxisDelta, TimeAxis};
use super::window::{Resolution, TimeWindow};
use super::{TimelineError, TimelineResult};

/// Pan distance for one arrow key press
pub const PAN_STEP_PX: f64 = 40.0;
/// Pan distance with the fast modifier held
pub const PAN_STEP_FAST_PX: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Earlier,
    Later,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy)]
struct HeaderDrag {
    anchor_x: f64,
    window: TimeWindow,
}

/// Turns zoom and pan gestures into new windows. Never touches items.
///
/// Windows are always sized to the visible width: the start is the anchor
/// and the end follows from the resolution and zoom.
#[derive(Debug, Clone)]
pub struct ViewportController {
    width_px: f64,
    header_drag: Option<HeaderDrag>,
}

impl ViewportController {
    pub fn new(width_px: f64) -> Self {
        Self {
            width_px: width_px.max(1.0),
            header_drag: None,
        }
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn set_width(&mut self, width_px: f64) {
        self.width_px = width_px.max(1.0);
    }

    /// Resize `window` so it exactly fills the visible width.
    ///
    /// Month windows are snapped to the first of the month so that every
    /// column is a whole month.
    pub fn fit(&self, window: &TimeWindow) -> TimelineResult<TimeWindow> {
        let units = self.width_px / window.unit_px();
        let (start, end) = match window.resolution.unit_duration() {
            Some(unit) => {
                let millis = (units * unit.num_milliseconds() as f64).round() as i64;
                let end = window
                    .start
                    .checked_add_signed(Duration::milliseconds(millis.max(1)));
                (window.start, end)
            }
            None => {
                let start = Resolution::Month.floor(window.start);
                let months = units.ceil().max(1.0) as u32;
                (start, start.checked_add_months(Months::new(months)))
            }
        };

        let end = end.ok_or(TimelineError::InvalidWindow { start, end: start })?;
        TimeWindow::new(start, end, window.resolution, window.zoom)
    }

    /// Step the zoom factor. `None` at either end of the zoom range.
    pub fn zoom(
        &self,
        window: &TimeWindow,
        direction: ZoomDirection,
    ) -> TimelineResult<Option<TimeWindow>> {
        let next = match direction {
            ZoomDirection::In => window.zoom.zoom_in(),
            ZoomDirection::Out => window.zoom.zoom_out(),
        };
        let Some(zoom) = next else {
            return Ok(None);
        };
        tracing::debug!(factor = zoom.factor(), "zoom changed");
        self.fit(&TimeWindow { zoom, ..*window }).map(Some)
    }

    /// Keyboard pan by a fixed pixel step.
    pub fn pan(
        &self,
        window: &TimeWindow,
        direction: PanDirection,
        fast: bool,
    ) -> TimelineResult<TimeWindow> {
        let step = if fast { PAN_STEP_FAST_PX } else { PAN_STEP_PX };
        let dx = match direction {
            PanDirection::Earlier => -step,
            PanDirection::Later => step,
        };

        let axis = TimeAxis::new(window)?;
        let mut delta = axis.delta_for(dx);
        // A pan step narrower than one month column still moves one month.
        if delta.is_zero() && window.resolution == Resolution::Month {
            delta = AxisDelta::Months(dx.signum() as i32);
        }
        self.shifted(window, delta)
    }

    /// Plain wheel pans; wheel with the zoom modifier zooms.
    pub fn wheel(
        &self,
        window: &TimeWindow,
        direction: ZoomDirection,
        zoom_modifier: bool,
    ) -> TimelineResult<Option<TimeWindow>> {
        if zoom_modifier {
            return self.zoom(window, direction);
        }
        let pan = match direction {
            ZoomDirection::In => PanDirection::Earlier,
            ZoomDirection::Out => PanDirection::Later,
        };
        self.pan(window, pan, false).map(Some)
    }

    pub fn begin_header_drag(&mut self, x: f64, window: &TimeWindow) {
        self.header_drag = Some(HeaderDrag {
            anchor_x: x,
            window: *window,
        });
    }

    pub fn is_header_dragging(&self) -> bool {
        self.header_drag.is_some()
    }

    /// Window for the header grabbed at press time and now held at `x`.
    ///
    /// Content follows the pointer, so dragging right moves the window
    /// earlier.
    pub fn header_drag_to(&self, x: f64) -> TimelineResult<Option<TimeWindow>> {
        let Some(drag) = self.header_drag else {
            return Ok(None);
        };
        let axis = TimeAxis::new(&drag.window)?;
        let delta = axis.delta_for(x - drag.anchor_x).negate();
        self.shifted(&drag.window, delta).map(Some)
    }

    pub fn end_header_drag(&mut self) {
        self.header_drag = None;
    }

    /// Same start, next resolution, refitted.
    pub fn cycle_resolution(&self, window: &TimeWindow) -> TimelineResult<TimeWindow> {
        let resolution = window.resolution.next();
        tracing::debug!(resolution = resolution.display_name(), "resolution changed");
        self.fit(&TimeWindow {
            resolution,
            ..*window
        })
    }

    /// Window starting at the unit boundary containing `now`.
    pub fn jump_to(&self, window: &TimeWindow, now: DateTime<Utc>) -> TimelineResult<TimeWindow> {
        self.fit(&TimeWindow {
            start: window.resolution.floor(now),
            ..*window
        })
    }

    fn shifted(&self, window: &TimeWindow, delta: AxisDelta) -> TimelineResult<TimeWindow> {
        let start = delta.apply(window.start).ok_or(TimelineError::InvalidWindow {
            start: window.start,
            end: window.end,
        })?;
        self.fit(&TimeWindow { start, ..*window })
    }
}
