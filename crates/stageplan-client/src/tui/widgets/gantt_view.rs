use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::timeline::{DragPhase, ItemRect, Layout, LayoutRow, Span};
use crate::tui::app::{App, LABEL_WIDTH};
use stageplan_common::group;

use super::axis_header::render_axis_header;

/// Terminal columns covered by `span`: always at least one.
pub fn bar_columns(span: &Span, cell_px: f64) -> (u16, u16) {
    let first = (span.x / cell_px).floor().max(0.0) as u16;
    let last = ((span.right() / cell_px).ceil() as u16).max(first + 1);
    (first, last - first)
}

pub fn render_gantt(frame: &mut Frame, app: &App, area: Rect) {
    app.chart_area.set(area);
    if area.height == 0 || area.width <= LABEL_WIDTH {
        return;
    }

    let Some(layout) = app.layout.as_ref() else {
        return;
    };

    render_axis_header(frame, app, layout, Rect { height: 1, ..area });

    let body = Rect {
        y: area.y + 1,
        height: area.height - 1,
        ..area
    };
    if layout.groups.is_empty() {
        let message = if app.is_syncing() {
            "Loading..."
        } else {
            "Nothing scheduled in this window."
        };
        let paragraph = Paragraph::new(message)
            .style(app.theme.muted)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, body);
        return;
    }

    render_rows(frame.buffer_mut(), app, layout, body);
}

fn render_rows(buf: &mut Buffer, app: &App, layout: &Layout, body: Rect) {
    let cell = app.cell_width_px();
    let chart = Rect {
        x: body.x + LABEL_WIDTH,
        width: body.width - LABEL_WIDTH,
        ..body
    };
    let label_width = usize::from(LABEL_WIDTH - 1);

    let mut lane_no = 0;
    for (index, row) in layout.rows().iter().enumerate() {
        let lane_label = match row {
            LayoutRow::Group(_) => {
                lane_no = 0;
                None
            }
            LayoutRow::Lane(_) => {
                lane_no += 1;
                Some(lane_no)
            }
        };
        if index < app.scroll || index - app.scroll >= usize::from(body.height) {
            continue;
        }
        let y = body.y + (index - app.scroll) as u16;

        match row {
            LayoutRow::Group(g) => {
                buf.set_stringn(
                    body.x,
                    y,
                    group::display_name(&g.key),
                    label_width,
                    app.theme.header,
                );
                let rule = "─".repeat(usize::from(chart.width));
                buf.set_stringn(chart.x, y, rule, usize::from(chart.width), app.theme.border);
            }
            LayoutRow::Lane(items) => {
                if let Some(n) = lane_label {
                    buf.set_stringn(body.x, y, format!("  {}", n), label_width, app.theme.muted);
                }
                if let Some(now) = layout.now_offset {
                    let column = (now / cell) as u16;
                    if column < chart.width {
                        buf.set_string(chart.x + column, y, "│", app.theme.now_marker);
                    }
                }
                for rect in items.iter() {
                    render_bar(buf, app, rect, chart, y);
                }
            }
        }
    }
}

fn render_bar(buf: &mut Buffer, app: &App, rect: &ItemRect, chart: Rect, y: u16) {
    let (first, width) = bar_columns(&rect.span, app.cell_width_px());
    if first >= chart.width {
        return;
    }
    let width = width.min(chart.width - first);
    let x = chart.x + first;

    let style = bar_style(app, rect);
    buf.set_style(Rect::new(x, y, width, 1), style);
    buf.set_stringn(x, y, bar_label(rect, usize::from(width)), usize::from(width), style);
}

fn bar_style(app: &App, rect: &ItemRect) -> Style {
    match app.scheduler.drag().phase(rect.item_id) {
        DragPhase::Dragging => app.theme.dragging,
        DragPhase::Committing => app.theme.committing,
        DragPhase::RollingBack => app.theme.rolling_back,
        DragPhase::Idle if app.selected == Some(rect.item_id) => app.theme.selected,
        DragPhase::Idle => app.theme.bar,
    }
}

/// Title with arrows on sides that continue outside the window.
pub fn bar_label(rect: &ItemRect, width: usize) -> String {
    let left = if rect.span.clipped_left { "◀" } else { " " };
    let mut label = format!("{}{}", left, rect.title);
    if rect.span.clipped_right && width > 1 {
        let mut fitted = String::new();
        for c in label.chars() {
            if fitted.width() + c.width().unwrap_or(0) > width - 1 {
                break;
            }
            fitted.push(c);
        }
        let pad = (width - 1).saturating_sub(fitted.width());
        label = format!("{}{}▶", fitted, " ".repeat(pad));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rect(title: &str, clipped_left: bool, clipped_right: bool) -> ItemRect {
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        ItemRect {
            item_id: 1,
            title: title.to_string(),
            start: t,
            end: t,
            span: Span {
                x: 0.0,
                width: 60.0,
                clipped_left,
                clipped_right,
            },
        }
    }

    #[test]
    fn test_bar_columns_round_outwards() {
        let span = Span {
            x: 15.0,
            width: 32.0,
            clipped_left: false,
            clipped_right: false,
        };
        assert_eq!(bar_columns(&span, 10.0), (1, 4));

        let sliver = Span {
            x: 30.0,
            width: 0.5,
            clipped_left: false,
            clipped_right: false,
        };
        assert_eq!(bar_columns(&sliver, 10.0), (3, 1));
    }

    #[test]
    fn test_bar_label_marks_clipped_sides() {
        assert_eq!(bar_label(&rect("Load-in", false, false), 6), " Load-in");
        assert_eq!(bar_label(&rect("Load-in", true, false), 6), "◀Load-in");
        assert_eq!(bar_label(&rect("Load-in", false, true), 6), " Load▶");
        assert_eq!(bar_label(&rect("Set", false, true), 6), " Set ▶");
    }
}
