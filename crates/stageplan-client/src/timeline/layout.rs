use std::borrow::Cow;

use chrono::{DateTime, Utc};
use stageplan_common::{ItemId, ScheduledItem};

use super::axis::{Span, Tick, TimeAxis};
use super::lanes::group_items;
use super::window::{Resolution, TimeWindow};
use super::TimelineResult;

/// Interval to show for one item in place of its authoritative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub item_id: ItemId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Screen rectangle of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRect {
    pub item_id: ItemId,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupLayout {
    pub key: String,
    /// Visible rectangles per lane. Lanes keep their index even when every
    /// item in them is scrolled out of the window.
    pub lanes: Vec<Vec<ItemRect>>,
}

/// One horizontal row of the rendered chart.
#[derive(Debug, Clone, Copy)]
pub enum LayoutRow<'a> {
    Group(&'a GroupLayout),
    Lane(&'a [ItemRect]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub groups: Vec<GroupLayout>,
    pub ticks: Vec<Tick>,
    pub now_offset: Option<f64>,
    pub total_width: f64,
    pub resolution: Resolution,
}

impl Layout {
    /// Rows top to bottom: each group header followed by its lanes.
    pub fn rows(&self) -> Vec<LayoutRow<'_>> {
        let mut rows = Vec::new();
        for group in &self.groups {
            rows.push(LayoutRow::Group(group));
            rows.extend(group.lanes.iter().map(|lane| LayoutRow::Lane(lane.as_slice())));
        }
        rows
    }

    /// Item under the pointer at `x` on row `row`, if any.
    pub fn hit(&self, row: usize, x: f64) -> Option<&ItemRect> {
        match self.rows().get(row)? {
            LayoutRow::Lane(items) => items.iter().find(|rect| rect.span.contains(x)),
            LayoutRow::Group(_) => None,
        }
    }

    pub fn find(&self, item_id: ItemId) -> Option<&ItemRect> {
        self.groups
            .iter()
            .flat_map(|group| group.lanes.iter().flatten())
            .find(|rect| rect.item_id == item_id)
    }

    /// Visible item ids in reading order (group, lane, left to right).
    pub fn item_order(&self) -> Vec<ItemId> {
        self.groups
            .iter()
            .flat_map(|group| group.lanes.iter().flatten())
            .map(|rect| rect.item_id)
            .collect()
    }
}

/// Authoritative items with overlaid intervals substituted in.
///
/// Borrows the input untouched when there is nothing to overlay.
pub fn merge_overlay<'a>(items: &'a [ScheduledItem], overlay: &[Overlay]) -> Cow<'a, [ScheduledItem]> {
    if overlay.is_empty() {
        return Cow::Borrowed(items);
    }
    Cow::Owned(
        items
            .iter()
            .map(|item| match overlay.iter().find(|o| o.item_id == item.id) {
                Some(o) => item.with_interval(o.start, o.end),
                None => item.clone(),
            })
            .collect(),
    )
}

/// Group, pack and position `items` for `window`.
///
/// Pure: safe to call on every item change, window change or drag tick.
pub fn compute_layout(
    items: &[ScheduledItem],
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> TimelineResult<Layout> {
    let axis = TimeAxis::new(window)?;

    let groups = group_items(items)
        .into_iter()
        .map(|group| GroupLayout {
            key: group.key,
            lanes: group
                .lanes
                .iter()
                .map(|lane| {
                    lane.items
                        .iter()
                        .filter_map(|item| {
                            axis.span(item.start, item.end).map(|span| ItemRect {
                                item_id: item.id,
                                title: item.title.clone(),
                                start: item.start,
                                end: item.end,
                                span,
                            })
                        })
                        .collect()
                })
                .collect(),
        })
        .collect();

    Ok(Layout {
        groups,
        ticks: axis.ticks(),
        now_offset: axis.now_offset(now),
        total_width: axis.total_width(),
        resolution: window.resolution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ZoomLevel;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, h, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(utc(1, 0), utc(8, 0), Resolution::Day, ZoomLevel::default()).unwrap()
    }

    fn items() -> Vec<ScheduledItem> {
        vec![
            ScheduledItem::new(1, "stage", "Build", utc(1, 0), utc(3, 0)).unwrap(),
            ScheduledItem::new(2, "stage", "Lights", utc(2, 0), utc(4, 0)).unwrap(),
            ScheduledItem::new(3, "audio", "PA", utc(2, 12), utc(3, 0)).unwrap(),
            ScheduledItem::new(4, "audio", "Outside", utc(10, 0), utc(11, 0)).unwrap(),
        ]
    }

    #[test]
    fn test_layout_groups_lanes_and_rects() {
        let layout = compute_layout(&items(), &window(), utc(3, 12)).unwrap();
        let keys: Vec<_> = layout.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["audio", "stage"]);

        let stage = &layout.groups[1];
        assert_eq!(stage.lanes.len(), 2);
        assert_eq!(stage.lanes[0][0].span.x, 0.0);
        assert_eq!(stage.lanes[0][0].span.width, 200.0);
        assert_eq!(stage.lanes[1][0].item_id, 2);

        // Item 4 is outside the window: packed but not drawn
        assert_eq!(layout.groups[0].lanes.len(), 1);
        assert_eq!(layout.groups[0].lanes[0].len(), 1);

        assert_eq!(layout.now_offset, Some(250.0));
        assert_eq!(layout.ticks.len(), 7);
        assert_eq!(layout.total_width, 700.0);
    }

    #[test]
    fn test_rows_and_hit_testing() {
        let layout = compute_layout(&items(), &window(), utc(1, 0)).unwrap();
        // audio header, audio lane, stage header, stage lane 0, stage lane 1
        assert_eq!(layout.rows().len(), 5);
        assert_eq!(layout.hit(1, 160.0).map(|r| r.item_id), Some(3));
        assert_eq!(layout.hit(3, 50.0).map(|r| r.item_id), Some(1));
        assert_eq!(layout.hit(4, 50.0), None);
        assert_eq!(layout.hit(2, 50.0), None);
        assert_eq!(layout.item_order(), vec![3, 1, 2]);
    }

    #[test]
    fn test_overlay_replaces_one_item_only() {
        let items = items();
        let overlay = [Overlay {
            item_id: 2,
            start: utc(5, 0),
            end: utc(6, 0),
        }];
        let merged = merge_overlay(&items, &overlay);
        assert_eq!((merged[1].start, merged[1].end), (utc(5, 0), utc(6, 0)));
        assert_eq!(merged[0], items[0]);
        // The authoritative list is untouched
        assert_eq!(items[1].start, utc(2, 0));

        let layout = compute_layout(&merged, &window(), utc(1, 0)).unwrap();
        // With item 2 moved away both stage items fit in one lane
        assert_eq!(layout.groups[1].lanes.len(), 1);
    }

    #[test]
    fn test_empty_overlay_borrows() {
        let items = items();
        assert!(matches!(merge_overlay(&items, &[]), Cow::Borrowed(_)));
    }

    #[test]
    fn test_layout_propagates_invalid_window() {
        let mut window = window();
        window.end = window.start;
        assert!(compute_layout(&items(), &window, utc(1, 0)).is_err());
    }
}
