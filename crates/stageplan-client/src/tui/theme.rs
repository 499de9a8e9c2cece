use ratatui::style::{Color, Modifier, Style};

use crate::config::{Rgb, ThemeColors};

fn fg(rgb: Rgb) -> Style {
    Style::default().fg(Color::Rgb(rgb.r, rgb.g, rgb.b))
}

fn bg(rgb: Rgb) -> Style {
    Style::default()
        .bg(Color::Rgb(rgb.r, rgb.g, rgb.b))
        .fg(Color::Black)
}

/// TUI theme with ratatui styles
#[derive(Debug, Clone)]
pub struct TuiTheme {
    pub muted: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub border: Style,
    pub title: Style,
    /// Group header rows
    pub header: Style,
    /// Item bar at rest
    pub bar: Style,
    /// Item bar under the pointer
    pub dragging: Style,
    /// Item bar waiting for the backend
    pub committing: Style,
    /// Item bar snapping back after a failed edit
    pub rolling_back: Style,
    pub selected: Style,
    pub now_marker: Style,
}

impl From<&ThemeColors> for TuiTheme {
    fn from(colors: &ThemeColors) -> Self {
        Self {
            muted: fg(colors.muted),
            success: fg(colors.success),
            warning: fg(colors.warning),
            error: fg(colors.error),
            info: fg(colors.info),
            border: Style::default().fg(Color::Rgb(80, 80, 100)),
            title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            header: fg(colors.info).add_modifier(Modifier::BOLD),
            bar: bg(colors.bar),
            dragging: bg(colors.warning).add_modifier(Modifier::BOLD),
            committing: bg(colors.warning).add_modifier(Modifier::DIM),
            rolling_back: bg(colors.error),
            selected: bg(colors.selected).add_modifier(Modifier::BOLD),
            now_marker: fg(colors.info).add_modifier(Modifier::BOLD),
        }
    }
}
