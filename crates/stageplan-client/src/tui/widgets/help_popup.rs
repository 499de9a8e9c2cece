use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::app::App;
use crate::tui::ui::centered_rect;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Timeline",
        &[
            ("←/→ h/l", "Pan (Shift: faster)"),
            ("+/-", "Zoom in / out"),
            ("r", "Cycle hour/day/week/month"),
            ("t", "Jump to today"),
            ("F5/R", "Refresh"),
        ],
    ),
    (
        "Items",
        &[
            ("j/↓ k/↑", "Select next / previous"),
            ("Enter", "Show details"),
            ("m", "Minimize details to dock"),
            ("1-9", "Restore docked details"),
            ("PgUp/PgDn", "Scroll rows"),
        ],
    ),
    (
        "Mouse",
        &[
            ("drag bar", "Move item"),
            ("drag edge", "Change start or end"),
            ("drag header", "Pan"),
            ("wheel", "Pan (Ctrl: zoom, Shift: rows)"),
        ],
    ),
    (
        "General",
        &[
            ("Esc", "Cancel drag / close"),
            ("?", "Toggle help"),
            ("q", "Quit"),
        ],
    ),
];

pub fn render_help_popup(frame: &mut Frame, app: &App) {
    let area = centered_rect(52, 30, frame.area());

    let block = Block::default()
        .title(" Keybindings ")
        .borders(Borders::ALL)
        .border_style(app.theme.border)
        .style(Style::default().bg(Color::Black));

    let key_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let desc_style = app.theme.muted;
    let section_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let mut text = Vec::new();
    for (title, bindings) in SECTIONS {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(format!("  {}", title), section_style)));
        for (key, desc) in bindings.iter() {
            text.push(Line::from(vec![
                Span::styled(format!("    {:<13}", key), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
    }

    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(text), inner);
}
