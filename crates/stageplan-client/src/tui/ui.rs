use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, PopupState};
use super::widgets::{
    detail_panel::{render_detail_panel, render_dock},
    gantt_view::render_gantt,
    help_popup::render_help_popup,
    status_bar::render_status_bar,
};

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let dock_height = if app.dock.entries().is_empty() { 0 } else { 1 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),           // Header
            Constraint::Min(1),              // Chart
            Constraint::Length(dock_height), // Dock
            Constraint::Length(2),           // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_content(frame, app, chunks[1]);
    render_dock(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.popup {
        Some(PopupState::Help) => render_help_popup(frame, app),
        Some(PopupState::Detail(item_id)) => render_detail_panel(frame, app, item_id),
        None => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let spans = vec![
        Span::styled("  stageplan", app.theme.title),
        Span::raw("  "),
        Span::styled(app.location.as_str(), app.theme.muted),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(app.theme.border);

    let inner = block.inner(area);
    frame.render_widget(block, area);
    render_gantt(frame, app, inner);
}

/// Helper function to create a centered rect
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
