use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use stageplan_common::{group, ScheduledItem};

/// A row of non-overlapping items, in placement order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lane {
    pub items: Vec<ScheduledItem>,
    /// Latest end among placed items; the lane is free from here on
    free_from: Option<DateTime<Utc>>,
}

impl Lane {
    /// Whether `item` can be appended without overlapping anything already
    /// in the lane. Zero-length items occupy no time and always fit.
    fn accepts(&self, item: &ScheduledItem) -> bool {
        item.start == item.end || self.free_from.map_or(true, |free| free <= item.start)
    }

    fn push(&mut self, item: ScheduledItem) {
        self.free_from = Some(self.free_from.map_or(item.end, |free| free.max(item.end)));
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items sharing one group key, packed into lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub lanes: Vec<Lane>,
}

/// Greedy interval partitioning.
///
/// Items are placed in start order (ties broken by id) into the first lane
/// that is free at the item's start, opening a new lane when none is. The
/// number of lanes equals the peak number of simultaneously active items.
pub fn assign_lanes(items: &[ScheduledItem]) -> Vec<Lane> {
    let mut sorted: Vec<&ScheduledItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut lanes: Vec<Lane> = Vec::new();
    for item in sorted {
        match lanes.iter_mut().find(|lane| lane.accepts(item)) {
            Some(lane) => lane.push(item.clone()),
            None => {
                let mut lane = Lane::default();
                lane.push(item.clone());
                lanes.push(lane);
            }
        }
    }
    lanes
}

/// Partition items by group key and pack each group independently.
///
/// Keys compare case-insensitively; the spelling shown is the one carried by
/// the lowest item id in the group. Groups come back in display order with
/// the default group last.
pub fn group_items(items: &[ScheduledItem]) -> Vec<Group> {
    let mut grouped: BTreeMap<(bool, String), Vec<ScheduledItem>> = BTreeMap::new();
    for item in items {
        let key = group::normalize_group_key(&item.group_key);
        let (is_default, folded, _) = group::sort_key(&key);
        grouped
            .entry((is_default, folded))
            .or_default()
            .push(item.clone());
    }

    grouped
        .into_values()
        .map(|members| {
            let key = members
                .iter()
                .min_by_key(|item| item.id)
                .map(|item| group::normalize_group_key(&item.group_key))
                .unwrap_or_else(|| group::DEFAULT_GROUP.to_string());
            Group {
                key,
                lanes: assign_lanes(&members),
            }
        })
        .collect()
}

/// Maximum number of items active at the same instant (the clique number of
/// the interval graph). Ends are processed before starts at equal instants,
/// so touching items do not count as concurrent.
pub fn peak_concurrency(items: &[ScheduledItem]) -> usize {
    let mut events: Vec<(DateTime<Utc>, i32)> = Vec::with_capacity(items.len() * 2);
    for item in items.iter().filter(|item| item.start < item.end) {
        events.push((item.start, 1));
        events.push((item.end, -1));
    }
    events.sort();

    let mut active = 0i32;
    let mut peak = 0i32;
    for (_, change) in events {
        active += change;
        peak = peak.max(active);
    }
    peak as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 9, h, m, 0).unwrap()
    }

    fn item(id: u64, start: (u32, u32), end: (u32, u32)) -> ScheduledItem {
        ScheduledItem::new(id, "crew", format!("shift {id}"), at(start.0, start.1), at(end.0, end.1))
            .unwrap()
    }

    fn ids(lanes: &[Lane]) -> Vec<Vec<u64>> {
        lanes
            .iter()
            .map(|lane| lane.items.iter().map(|i| i.id).collect())
            .collect()
    }

    fn assert_no_overlap(lanes: &[Lane]) {
        for lane in lanes {
            for (i, a) in lane.items.iter().enumerate() {
                for b in &lane.items[i + 1..] {
                    let overlap = a.start < b.end && b.start < a.end;
                    assert!(!overlap, "items {} and {} overlap", a.id, b.id);
                }
            }
        }
    }

    #[test]
    fn test_touching_items_share_a_lane() {
        let a = item(1, (10, 0), (12, 0));
        let b = item(2, (11, 0), (13, 0));
        let c = item(3, (12, 0), (14, 0));
        let lanes = assign_lanes(&[c, a, b]);
        assert_eq!(ids(&lanes), vec![vec![1, 3], vec![2]]);
    }

    #[test]
    fn test_ties_break_by_id() {
        let items = vec![
            item(9, (8, 0), (9, 0)),
            item(4, (8, 0), (9, 0)),
            item(6, (8, 0), (10, 0)),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        assert_eq!(ids(&assign_lanes(&items)), vec![vec![4], vec![6], vec![9]]);
        assert_eq!(assign_lanes(&items), assign_lanes(&reversed));
    }

    #[test]
    fn test_lane_count_matches_peak_concurrency() {
        let items = vec![
            item(1, (8, 0), (12, 0)),
            item(2, (9, 0), (10, 0)),
            item(3, (9, 30), (11, 0)),
            item(4, (10, 0), (10, 45)),
            item(5, (11, 0), (13, 0)),
            item(6, (12, 0), (12, 30)),
            item(7, (6, 0), (8, 0)),
            item(8, (10, 15), (14, 0)),
        ];
        let lanes = assign_lanes(&items);
        assert_no_overlap(&lanes);
        assert_eq!(lanes.len(), peak_concurrency(&items));
        assert_eq!(lanes.iter().map(Lane::len).sum::<usize>(), items.len());
    }

    #[test]
    fn test_zero_length_items_never_open_a_lane() {
        let items = vec![
            item(1, (8, 0), (12, 0)),
            item(2, (10, 0), (10, 0)),
            item(3, (12, 0), (13, 0)),
        ];
        let lanes = assign_lanes(&items);
        assert_eq!(ids(&lanes), vec![vec![1, 2, 3]]);
        assert_eq!(peak_concurrency(&items), 1);
    }

    #[test]
    fn test_zero_length_item_does_not_shrink_lane_frontier() {
        // The marker at 9:00 must not let 10:00-11:00 into the 8-12 lane.
        let items = vec![
            item(1, (8, 0), (12, 0)),
            item(2, (9, 0), (9, 0)),
            item(3, (10, 0), (11, 0)),
        ];
        assert_eq!(ids(&assign_lanes(&items)), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_groups_are_case_insensitive_and_ordered() {
        let mut a = item(5, (8, 0), (9, 0));
        a.group_key = "audio".into();
        let mut b = item(2, (8, 0), (9, 0));
        b.group_key = "Audio".into();
        let mut c = item(3, (8, 0), (9, 0));
        c.group_key = group::DEFAULT_GROUP.into();
        let mut d = item(4, (8, 0), (9, 0));
        d.group_key = "Catering".into();

        let groups = group_items(&[a, b, c, d]);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Audio", "Catering", group::DEFAULT_GROUP]);
        assert_eq!(groups[0].lanes.len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_lanes() {
        assert!(assign_lanes(&[]).is_empty());
        assert!(group_items(&[]).is_empty());
        assert_eq!(peak_concurrency(&[]), 0);
    }
}
