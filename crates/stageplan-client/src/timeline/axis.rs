use chrono::{DateTime, Duration, Months, Utc};

use super::window::{month_index, month_start, Resolution, TimeWindow};
use super::{TimelineError, TimelineResult};

/// Labelled unit boundary on the axis header.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub instant: DateTime<Utc>,
    pub offset: f64,
    pub label: String,
}

/// Horizontal extent of a rendered item, already clamped to the visual floor
/// and clipped to `[0, total_width]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub x: f64,
    pub width: f64,
    /// The item continues past the left edge of the window
    pub clipped_left: bool,
    /// The item continues past the right edge of the window
    pub clipped_right: bool,
}

impl Span {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x && x < self.right()
    }
}

/// Time delta produced by a horizontal pointer movement.
///
/// Month resolution moves in whole calendar months rather than a fixed
/// duration, so both shapes are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisDelta {
    Linear(Duration),
    Months(i32),
}

impl AxisDelta {
    pub fn is_zero(self) -> bool {
        match self {
            AxisDelta::Linear(d) => d == Duration::zero(),
            AxisDelta::Months(n) => n == 0,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            AxisDelta::Linear(d) => AxisDelta::Linear(-d),
            AxisDelta::Months(n) => AxisDelta::Months(-n),
        }
    }

    /// Shift `t` by this delta; `None` when the result is out of range.
    pub fn apply(self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AxisDelta::Linear(d) => t.checked_add_signed(d),
            AxisDelta::Months(n) if n >= 0 => t.checked_add_months(Months::new(n as u32)),
            AxisDelta::Months(n) => t.checked_sub_months(Months::new(n.unsigned_abs())),
        }
    }
}

/// Mapping between instants and pixel offsets for one [`TimeWindow`].
#[derive(Debug, Clone)]
pub struct TimeAxis {
    window: TimeWindow,
    unit_px: f64,
    total_width: f64,
}

impl TimeAxis {
    pub fn new(window: &TimeWindow) -> TimelineResult<Self> {
        if window.start >= window.end {
            return Err(TimelineError::InvalidWindow {
                start: window.start,
                end: window.end,
            });
        }

        let unit_px = window.unit_px();
        let mut axis = Self {
            window: *window,
            unit_px,
            total_width: 0.0,
        };
        axis.total_width = match window.resolution {
            Resolution::Month => {
                let mut months = month_index(window.end) - month_index(window.start);
                if month_start(month_index(window.end)) != Some(window.end) {
                    months += 1;
                }
                months.max(1) as f64 * unit_px
            }
            _ => axis.to_pixel(window.end),
        };
        Ok(axis)
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn unit_px(&self) -> f64 {
        self.unit_px
    }

    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    /// Offset of `t` from the left edge of the window.
    pub fn to_pixel(&self, t: DateTime<Utc>) -> f64 {
        match self.window.resolution.unit_duration() {
            Some(unit) => {
                let elapsed = (t - self.window.start).num_milliseconds() as f64;
                elapsed / unit.num_milliseconds() as f64 * self.unit_px
            }
            // Month columns are equal width regardless of month length.
            None => (month_index(t) - month_index(self.window.start)) as f64 * self.unit_px,
        }
    }

    /// Inverse of [`TimeAxis::to_pixel`].
    ///
    /// For Month resolution the result is the first instant of the month
    /// column under `offset`.
    pub fn to_instant(&self, offset: f64) -> DateTime<Utc> {
        match self.window.resolution.unit_duration() {
            Some(unit) => {
                let millis = (offset / self.unit_px * unit.num_milliseconds() as f64).round();
                self.window
                    .start
                    .checked_add_signed(Duration::milliseconds(millis as i64))
                    .unwrap_or(if millis < 0.0 {
                        DateTime::<Utc>::MIN_UTC
                    } else {
                        DateTime::<Utc>::MAX_UTC
                    })
            }
            None => {
                let column = (offset / self.unit_px).floor() as i64;
                month_start(month_index(self.window.start) + column).unwrap_or(self.window.start)
            }
        }
    }

    /// Time delta corresponding to a horizontal movement of `dx` pixels.
    pub fn delta_for(&self, dx: f64) -> AxisDelta {
        match self.window.resolution.unit_duration() {
            Some(unit) => {
                let millis = (dx / self.unit_px * unit.num_milliseconds() as f64).round();
                AxisDelta::Linear(Duration::milliseconds(millis as i64))
            }
            None => AxisDelta::Months((dx / self.unit_px).trunc() as i32),
        }
    }

    /// Rendered extent of an item, or `None` when it lies outside the window.
    pub fn span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Span> {
        let window = &self.window;
        let zero_length = start == end;
        if start >= window.end || end < window.start || (!zero_length && end == window.start) {
            return None;
        }

        let x0 = self.to_pixel(start);
        let x1 = self.to_pixel(end);
        let width = (x1 - x0).max(self.window.resolution.min_item_px());

        let left = x0.max(0.0);
        let right = (x0 + width).min(self.total_width);
        if right <= left {
            return None;
        }

        Some(Span {
            x: left,
            width: right - left,
            clipped_left: x0 < 0.0,
            clipped_right: x0 + width > self.total_width,
        })
    }

    /// Unit boundaries spanning the window, for axis labels.
    pub fn ticks(&self) -> Vec<Tick> {
        let resolution = self.window.resolution;
        let format = resolution.tick_format();
        let mut ticks = Vec::new();

        if resolution == Resolution::Month {
            let first = month_index(self.window.start);
            let columns = (self.total_width / self.unit_px).round() as i64;
            for column in 0..columns {
                if let Some(instant) = month_start(first + column) {
                    ticks.push(Tick {
                        instant,
                        offset: column as f64 * self.unit_px,
                        label: instant.format(format).to_string(),
                    });
                }
            }
            return ticks;
        }

        let mut t = resolution.floor(self.window.start);
        if t < self.window.start {
            t = resolution.step(t);
        }
        while t < self.window.end {
            ticks.push(Tick {
                instant: t,
                offset: self.to_pixel(t),
                label: t.format(format).to_string(),
            });
            t = resolution.step(t);
        }
        ticks
    }

    /// Offset of the "now" marker, omitted outside the window.
    pub fn now_offset(&self, now: DateTime<Utc>) -> Option<f64> {
        self.window.contains(now).then(|| self.to_pixel(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ZoomLevel;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn axis(resolution: Resolution, start: DateTime<Utc>, end: DateTime<Utc>) -> TimeAxis {
        let window = TimeWindow::new(start, end, resolution, ZoomLevel::default()).unwrap();
        TimeAxis::new(&window).unwrap()
    }

    #[test]
    fn test_day_resolution_maps_half_day() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 0), utc(2026, 1, 8, 0));
        assert_eq!(axis.unit_px(), 100.0);
        assert_eq!(axis.to_pixel(utc(2026, 1, 2, 12)), 150.0);
        assert_eq!(axis.total_width(), 700.0);
    }

    #[test]
    fn test_zoom_scales_unit_width() {
        let window = TimeWindow::new(
            utc(2026, 1, 1, 0),
            utc(2026, 1, 2, 0),
            Resolution::Hour,
            ZoomLevel::nearest(2.0),
        )
        .unwrap();
        let axis = TimeAxis::new(&window).unwrap();
        assert_eq!(axis.to_pixel(utc(2026, 1, 1, 3)), 240.0);
    }

    #[test]
    fn test_linear_round_trips() {
        for resolution in [Resolution::Hour, Resolution::Day, Resolution::Week] {
            let axis = axis(resolution, utc(2026, 1, 1, 0), utc(2026, 3, 1, 0));
            for t in [
                utc(2026, 1, 1, 0),
                Utc.with_ymd_and_hms(2026, 1, 9, 7, 13, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 2, 17, 23, 59, 0).unwrap(),
            ] {
                assert_eq!(axis.to_instant(axis.to_pixel(t)), t);
            }
            for x in [0.0, 17.5, 333.25, 1024.0] {
                assert!((axis.to_pixel(axis.to_instant(x)) - x).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_month_columns_have_equal_width() {
        let axis = axis(Resolution::Month, utc(2026, 1, 1, 0), utc(2026, 5, 1, 0));
        // February is shorter than March but both columns are 300px
        assert_eq!(axis.to_pixel(utc(2026, 2, 1, 0)), 300.0);
        assert_eq!(axis.to_pixel(utc(2026, 3, 1, 0)), 600.0);
        assert_eq!(axis.to_pixel(utc(2026, 3, 31, 23)), 600.0);
        assert_eq!(axis.total_width(), 1200.0);
    }

    #[test]
    fn test_month_round_trip_is_month_granular() {
        let axis = axis(Resolution::Month, utc(2026, 1, 1, 0), utc(2026, 12, 1, 0));
        let t = utc(2026, 4, 17, 9);
        assert_eq!(axis.to_instant(axis.to_pixel(t)), utc(2026, 4, 1, 0));
        assert_eq!(axis.to_instant(450.0), utc(2026, 2, 1, 0));
    }

    #[test]
    fn test_month_window_counts_partial_months() {
        let axis = axis(Resolution::Month, utc(2026, 1, 15, 0), utc(2026, 3, 2, 0));
        assert_eq!(axis.total_width(), 900.0);
        let labels: Vec<_> = axis.ticks().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["Jan 2026", "Feb 2026", "Mar 2026"]);
    }

    #[test]
    fn test_invalid_window_fails_fast() {
        let window = TimeWindow::new(
            utc(2026, 1, 1, 0),
            utc(2026, 1, 1, 0),
            Resolution::Day,
            ZoomLevel::default(),
        )
        .unwrap();
        assert!(matches!(
            TimeAxis::new(&window),
            Err(TimelineError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_span_applies_visual_floor() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 0), utc(2026, 1, 8, 0));
        let span = axis.span(utc(2026, 1, 2, 0), utc(2026, 1, 2, 1)).unwrap();
        assert_eq!(span.x, 100.0);
        assert_eq!(span.width, Resolution::Day.min_item_px());
    }

    #[test]
    fn test_span_clips_to_window() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 0), utc(2026, 1, 8, 0));
        let span = axis.span(utc(2025, 12, 30, 0), utc(2026, 1, 2, 0)).unwrap();
        assert_eq!((span.x, span.width), (0.0, 100.0));
        assert!(span.clipped_left);
        assert!(!span.clipped_right);

        let span = axis.span(utc(2026, 1, 7, 0), utc(2026, 1, 12, 0)).unwrap();
        assert_eq!((span.x, span.width), (600.0, 100.0));
        assert!(span.clipped_right);
    }

    #[test]
    fn test_span_outside_window_is_none() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 0), utc(2026, 1, 8, 0));
        assert_eq!(axis.span(utc(2025, 12, 1, 0), utc(2026, 1, 1, 0)), None);
        assert_eq!(axis.span(utc(2026, 1, 8, 0), utc(2026, 1, 9, 0)), None);
    }

    #[test]
    fn test_day_ticks_skip_partial_first_unit() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 6), utc(2026, 1, 4, 0));
        let ticks = axis.ticks();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].instant, utc(2026, 1, 2, 0));
        assert_eq!(ticks[0].offset, 75.0);
        assert_eq!(ticks[0].label, "Fri 02");
    }

    #[test]
    fn test_week_ticks_fall_on_mondays() {
        let axis = axis(Resolution::Week, utc(2026, 1, 1, 0), utc(2026, 1, 31, 0));
        let instants: Vec<_> = axis.ticks().into_iter().map(|t| t.instant).collect();
        assert_eq!(
            instants,
            vec![
                utc(2026, 1, 5, 0),
                utc(2026, 1, 12, 0),
                utc(2026, 1, 19, 0),
                utc(2026, 1, 26, 0)
            ]
        );
    }

    #[test]
    fn test_now_offset_only_inside_window() {
        let axis = axis(Resolution::Day, utc(2026, 1, 1, 0), utc(2026, 1, 8, 0));
        assert_eq!(axis.now_offset(utc(2026, 1, 3, 0)), Some(200.0));
        assert_eq!(axis.now_offset(utc(2026, 1, 9, 0)), None);
    }

    #[test]
    fn test_delta_for_month_truncates() {
        let axis = axis(Resolution::Month, utc(2026, 1, 1, 0), utc(2026, 6, 1, 0));
        assert_eq!(axis.delta_for(599.0), AxisDelta::Months(1));
        assert_eq!(axis.delta_for(-310.0), AxisDelta::Months(-1));
        assert_eq!(
            AxisDelta::Months(-2).apply(utc(2026, 1, 31, 0)),
            Some(utc(2025, 11, 30, 0))
        );
    }
}
