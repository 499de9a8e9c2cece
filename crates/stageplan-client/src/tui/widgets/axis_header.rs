use ratatui::{layout::Rect, Frame};
use unicode_width::UnicodeWidthStr;

use crate::timeline::Layout;
use crate::tui::app::{App, LABEL_WIDTH};

/// Tick labels above the chart, plus resolution and zoom in the label
/// column. Labels that would overlap the previous one are skipped.
pub fn render_axis_header(frame: &mut Frame, app: &App, layout: &Layout, area: Rect) {
    let buf = frame.buffer_mut();
    let cell = app.cell_width_px();
    let chart_x = area.x + LABEL_WIDTH;
    let chart_width = area.width.saturating_sub(LABEL_WIDTH);

    let scale = format!(
        "{} ×{}",
        layout.resolution.display_name(),
        app.window().zoom.factor()
    );
    buf.set_stringn(
        area.x,
        area.y,
        scale,
        usize::from(LABEL_WIDTH - 1),
        app.theme.title,
    );

    let mut free_from = 0u16;
    for tick in &layout.ticks {
        let column = (tick.offset / cell).round() as u16;
        if column < free_from || column >= chart_width {
            continue;
        }
        let text = format!("▏{}", tick.label);
        let room = usize::from(chart_width - column);
        buf.set_stringn(chart_x + column, area.y, &text, room, app.theme.muted);
        free_from = column + text.width() as u16 + 1;
    }

    if let Some(now) = layout.now_offset {
        let column = (now / cell) as u16;
        if column < chart_width {
            buf.set_string(chart_x + column, area.y, "▼", app.theme.now_marker);
        }
    }
}
