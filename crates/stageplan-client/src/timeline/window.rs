use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{TimelineError, TimelineResult};

/// Discrete time unit governing tick spacing and default item width.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl Resolution {
    /// Cycle to the next (coarser) resolution, wrapping back to Hour
    pub fn next(self) -> Self {
        match self {
            Resolution::Hour => Resolution::Day,
            Resolution::Day => Resolution::Week,
            Resolution::Week => Resolution::Month,
            Resolution::Month => Resolution::Hour,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Resolution::Hour => "Hour",
            Resolution::Day => "Day",
            Resolution::Week => "Week",
            Resolution::Month => "Month",
        }
    }

    /// Fixed length of one unit. Months have no fixed length.
    pub fn unit_duration(self) -> Option<Duration> {
        match self {
            Resolution::Hour => Some(Duration::hours(1)),
            Resolution::Day => Some(Duration::days(1)),
            Resolution::Week => Some(Duration::weeks(1)),
            Resolution::Month => None,
        }
    }

    /// Width of one unit at zoom factor 1.0
    pub fn base_unit_px(self) -> f64 {
        match self {
            Resolution::Hour => 40.0,
            Resolution::Day => 100.0,
            Resolution::Week => 280.0,
            Resolution::Month => 300.0,
        }
    }

    /// Narrowest rectangle an item is drawn with, whatever its duration.
    pub fn min_item_px(self) -> f64 {
        match self {
            Resolution::Hour => 30.0,
            Resolution::Day => 32.0,
            Resolution::Week => 36.0,
            Resolution::Month => 40.0,
        }
    }

    pub fn tick_format(self) -> &'static str {
        match self {
            Resolution::Hour => "%H:%M",
            Resolution::Day => "%a %d",
            Resolution::Week => "W%V",
            Resolution::Month => "%b %Y",
        }
    }

    /// Start of the unit containing `t`.
    pub fn floor(self, t: DateTime<Utc>) -> DateTime<Utc> {
        let floored = match self {
            Resolution::Hour => Utc
                .with_ymd_and_hms(t.year(), t.month(), t.day(), t.hour(), 0, 0)
                .single(),
            Resolution::Day => Utc
                .with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
                .single(),
            Resolution::Week => Utc
                .with_ymd_and_hms(t.year(), t.month(), t.day(), 0, 0, 0)
                .single()
                .map(|day| day - Duration::days(t.weekday().num_days_from_monday() as i64)),
            Resolution::Month => Utc.with_ymd_and_hms(t.year(), t.month(), 1, 0, 0, 0).single(),
        };
        floored.unwrap_or(t)
    }

    /// The unit boundary following the boundary `t`.
    pub fn step(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self.unit_duration() {
            Some(unit) => t + unit,
            None => month_start(month_index(t) + 1).unwrap_or(t),
        }
    }
}

/// Calendar month index used by the Month resolution: `year * 12 + month0`.
pub(crate) fn month_index(t: DateTime<Utc>) -> i64 {
    t.year() as i64 * 12 + t.month0() as i64
}

/// First instant of the month with the given index.
pub(crate) fn month_start(index: i64) -> Option<DateTime<Utc>> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()
}

/// Fixed ordered set of zoom factors.
pub const ZOOM_STEPS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// Index into [`ZOOM_STEPS`]. Serialized as the factor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoomLevel(usize);

impl ZoomLevel {
    pub fn factor(self) -> f64 {
        ZOOM_STEPS[self.0]
    }

    pub fn zoom_in(self) -> Option<Self> {
        (self.0 + 1 < ZOOM_STEPS.len()).then(|| Self(self.0 + 1))
    }

    pub fn zoom_out(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// The step closest to `factor`
    pub fn nearest(factor: f64) -> Self {
        let index = ZOOM_STEPS
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (*a - factor)
                    .abs()
                    .partial_cmp(&(*b - factor).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
            .unwrap_or(3);
        Self(index)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self::nearest(1.0)
    }
}

impl Serialize for ZoomLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.factor())
    }
}

impl<'de> Deserialize<'de> for ZoomLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let factor = f64::deserialize(deserializer)?;
        Ok(Self::nearest(factor))
    }
}

/// Visible time range plus the resolution and zoom defining the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resolution: Resolution,
    pub zoom: ZoomLevel,
}

impl TimeWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        resolution: Resolution,
        zoom: ZoomLevel,
    ) -> TimelineResult<Self> {
        if start > end {
            return Err(TimelineError::InvalidWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            resolution,
            zoom,
        })
    }

    /// Pixel width of one resolution unit at the current zoom
    pub fn unit_px(&self) -> f64 {
        self.resolution.base_unit_px() * self.zoom.factor()
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}
