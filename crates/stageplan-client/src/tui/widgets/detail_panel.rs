use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::timeline::DragPhase;
use crate::tui::app::App;
use crate::tui::ui::centered_rect;
use stageplan_common::{group, ItemId};

const TIME_FORMAT: &str = "%a %Y-%m-%d %H:%M";

/// Human readable duration, coarsest units first
fn format_duration(duration: chrono::Duration) -> String {
    let minutes = duration.num_minutes();
    let (days, hours, mins) = (minutes / 1440, minutes % 1440 / 60, minutes % 60);
    match (days, hours, mins) {
        (0, 0, m) => format!("{}m", m),
        (0, h, 0) => format!("{}h", h),
        (0, h, m) => format!("{}h {}m", h, m),
        (d, 0, _) => format!("{}d", d),
        (d, h, _) => format!("{}d {}h", d, h),
    }
}

pub fn render_detail_panel(frame: &mut Frame, app: &App, item_id: ItemId) {
    let area = centered_rect(54, 11, frame.area());

    let block = Block::default()
        .title(format!(" Item {} ", item_id))
        .borders(Borders::ALL)
        .border_style(app.theme.border)
        .style(Style::default().bg(Color::Black));

    let label = app.theme.muted;
    let text = match app.item(item_id) {
        Some(item) => {
            let state = match app.scheduler.drag().phase(item_id) {
                DragPhase::Idle => Span::styled("saved", app.theme.success),
                DragPhase::Dragging => Span::styled("moving", app.theme.warning),
                DragPhase::Committing => Span::styled("saving...", app.theme.warning),
                DragPhase::RollingBack => Span::styled("reverting", app.theme.error),
            };
            vec![
                Line::from(""),
                Line::from(Span::styled(format!("  {}", item.title), app.theme.title)),
                Line::from(vec![
                    Span::styled("  Group     ", label),
                    Span::raw(group::display_name(&item.group_key)),
                ]),
                Line::from(vec![
                    Span::styled("  Start     ", label),
                    Span::raw(item.start.format(TIME_FORMAT).to_string()),
                ]),
                Line::from(vec![
                    Span::styled("  End       ", label),
                    Span::raw(item.end.format(TIME_FORMAT).to_string()),
                ]),
                Line::from(vec![
                    Span::styled("  Duration  ", label),
                    Span::raw(format_duration(item.duration())),
                ]),
                Line::from(vec![Span::styled("  State     ", label), state]),
                Line::from(""),
                Line::from(Span::styled("  [m] minimize  [Esc] close", label)),
            ]
        }
        None => vec![
            Line::from(""),
            Line::from(Span::styled("  Not in the loaded window.", app.theme.warning)),
        ],
    };

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(text), inner);
}

/// One line listing minimized detail panels by slot.
pub fn render_dock(frame: &mut Frame, app: &App, area: Rect) {
    let entries = app.dock.entries();
    if entries.is_empty() {
        return;
    }

    let mut spans = vec![Span::styled("  Docked:", app.theme.muted)];
    for (slot, item_id) in entries.into_iter().enumerate() {
        let title = app
            .item(item_id)
            .map(|item| item.title.clone())
            .unwrap_or_else(|| format!("#{}", item_id));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!("[{}]", slot + 1), app.theme.info));
        spans.push(Span::raw(format!(" {}", title)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(3)), "3h");
        assert_eq!(format_duration(Duration::minutes(150)), "2h 30m");
        assert_eq!(format_duration(Duration::days(2)), "2d");
        assert_eq!(format_duration(Duration::hours(30)), "1d 6h");
    }
}
