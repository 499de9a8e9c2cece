use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::timeline::{ItemRect, Layout};
use stageplan_common::{group, ScheduledItem};

/// Plain-text rendering of a computed layout for the terminal.
pub struct Render {
    /// Pixels represented by one character column
    cell_width_px: f64,
}

impl Render {
    pub fn new(cell_width_px: u16) -> Self {
        Self {
            cell_width_px: f64::from(cell_width_px.max(1)),
        }
    }

    fn columns(&self, px: f64) -> usize {
        (px / self.cell_width_px).round().max(0.0) as usize
    }

    /// One character row with a bar per item, labelled with the item id.
    pub fn lane_bar(&self, lane: &[ItemRect], total_width: f64) -> String {
        let width = self.columns(total_width);
        let mut cells = vec![' '; width];
        for rect in lane {
            let start = self.columns(rect.span.x).min(width);
            let end = self.columns(rect.span.right()).clamp(start + 1, width.max(start + 1));
            for (i, cell) in cells.iter_mut().enumerate().take(end.min(width)).skip(start) {
                *cell = if i == start && !rect.span.clipped_left {
                    '▕'
                } else {
                    '█'
                };
            }
        }
        cells.into_iter().collect()
    }

    fn axis_line(&self, layout: &Layout) -> String {
        let width = self.columns(layout.total_width);
        let mut line = String::with_capacity(width);
        for tick in &layout.ticks {
            let col = self.columns(tick.offset);
            if col < line.width() || col >= width {
                continue;
            }
            line.push_str(&" ".repeat(col - line.width()));
            line.push_str(&tick.label);
        }
        line
    }

    fn item_line(&self, item: &ItemRect) -> String {
        let id = item.item_id.to_string();
        let padding = " ".repeat(4usize.saturating_sub(id.len()));
        format!(
            "{}{} {}  {}",
            padding,
            format!("{}.", id).dimmed(),
            item.title,
            format!(
                "{} → {}",
                item.start.format("%b %d %H:%M"),
                item.end.format("%b %d %H:%M")
            )
            .dimmed()
        )
    }

    pub fn display_layout(&self, layout: &Layout, items: &[ScheduledItem]) {
        if layout.groups.is_empty() {
            println!("\n  {}\n", "Nothing scheduled in this range.".dimmed());
            return;
        }

        println!("\n  {}  {}", " ".repeat(8), self.axis_line(layout).dimmed());
        for group_layout in &layout.groups {
            let count: usize = group_layout.lanes.iter().map(Vec::len).sum();
            println!(
                "\n  {} {}",
                group::display_name(&group_layout.key).underline(),
                format!("[{count} items, {} lanes]", group_layout.lanes.len()).dimmed()
            );
            for (index, lane) in group_layout.lanes.iter().enumerate() {
                println!(
                    "  {}  {}",
                    format!("lane {:<3}", index + 1).dimmed(),
                    self.lane_bar(lane, layout.total_width).magenta()
                );
            }
            for lane in &group_layout.lanes {
                for rect in lane {
                    println!("{}", self.item_line(rect));
                }
            }
        }

        let peak = crate::timeline::peak_concurrency(items);
        println!(
            "\n  {}\n",
            format!("{} items · peak concurrency {}", items.len(), peak).dimmed()
        );
    }

    pub fn item_created(&self, item: &ScheduledItem) {
        println!(
            "\n  {} {}\n",
            "✔".green(),
            format!(
                "Created item {} in {}",
                item.id.to_string().bold(),
                group::display_name(&item.group_key)
            )
            .dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Span;
    use chrono::{TimeZone, Utc};

    fn rect(x: f64, width: f64) -> ItemRect {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        ItemRect {
            item_id: 1,
            title: "Build".into(),
            start: t,
            end: t,
            span: Span {
                x,
                width,
                clipped_left: false,
                clipped_right: false,
            },
        }
    }

    #[test]
    fn test_lane_bar_places_items_by_cell() {
        let render = Render::new(10);
        let bar = render.lane_bar(&[rect(20.0, 40.0), rect(80.0, 10.0)], 100.0);
        assert_eq!(bar, "  ▕███  ▕ ");
        assert_eq!(bar.chars().count(), 10);
    }

    #[test]
    fn test_lane_bar_never_overflows() {
        let render = Render::new(10);
        let bar = render.lane_bar(&[rect(95.0, 40.0)], 100.0);
        assert_eq!(bar.chars().count(), 10);
    }
}
