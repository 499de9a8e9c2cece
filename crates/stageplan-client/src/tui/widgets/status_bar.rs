use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::app::{App, StatusKind};

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    // Window summary or status message
    if let Some(ref msg) = app.status_message {
        let style = match msg.kind {
            StatusKind::Success => app.theme.success,
            StatusKind::Error => app.theme.error,
            StatusKind::Info => app.theme.info,
        };
        let line = Line::from(vec![Span::raw("  "), Span::styled(&msg.text, style)]);
        frame.render_widget(Paragraph::new(line), chunks[0]);
    } else {
        frame.render_widget(Paragraph::new(summary_line(app)), chunks[0]);
    }

    let keybindings = if app.scheduler.drag().is_dragging() {
        vec![("Esc", "Cancel drag")]
    } else {
        vec![
            ("?", "Help"),
            ("←/→", "Pan"),
            ("+/-", "Zoom"),
            ("r", "Resolution"),
            ("t", "Today"),
            ("Enter", "Details"),
            ("q", "Quit"),
        ]
    };

    let mut spans: Vec<Span> = vec![Span::raw("  ")];
    for (i, (key, desc)) in keybindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", app.theme.muted));
        }
        spans.push(Span::styled(
            format!("[{}]", key),
            app.theme.muted.add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {}", desc), app.theme.muted));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[1]);
}

fn summary_line(app: &App) -> Line<'static> {
    let window = app.window();
    let format = "%Y-%m-%d %H:%M";
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(window.start.format(format).to_string(), app.theme.info),
        Span::styled(" → ", app.theme.muted),
        Span::styled(window.end.format(format).to_string(), app.theme.info),
        Span::styled(" · ", app.theme.muted),
        Span::styled(format!("{} items", app.scheduler.items().len()), app.theme.muted),
    ];

    let pending = app.scheduler.drag().pending();
    if pending > 0 {
        spans.push(Span::styled(" · ", app.theme.muted));
        spans.push(Span::styled(format!("{} saving", pending), app.theme.warning));
    }
    if app.is_syncing() {
        spans.push(Span::styled(" · ", app.theme.muted));
        spans.push(Span::styled("syncing", app.theme.warning));
    }
    Line::from(spans)
}
