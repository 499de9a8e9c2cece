mod actions;
mod app;
mod event;
mod jobs;
mod theme;
mod ui;
pub mod widgets;

use crate::error::{Result, StageplanError};
use crate::planner::Planner;
pub use app::App;

use std::io;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::storage::ScheduleBackend;
use app::StatusKind;

const TICK_RATE_MS: u64 = 250;

fn tui_error(e: impl std::fmt::Display) -> StageplanError {
    StageplanError::Tui(e.to_string())
}

/// Run the TUI application
pub fn run(data_dir: Option<&Path>) -> Result<()> {
    let planner = Planner::new(data_dir)?;
    let mut app = App::new(planner.config.clone(), planner.location())?;

    let mut events = event::EventHandler::new(TICK_RATE_MS);
    if let Some(client) = planner.events() {
        events = events.with_server_events(client.clone());
    }

    // Setup terminal
    enable_raw_mode().map_err(tui_error)?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )
    .map_err(tui_error)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(tui_error)?;

    tracing::info!(location = %planner.location(), "timeline opened");
    let res = run_app(&mut terminal, &mut app, &events, planner.backend());

    // Restore terminal
    disable_raw_mode().map_err(tui_error)?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )
    .map_err(tui_error)?;
    terminal.show_cursor().map_err(tui_error)?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &event::EventHandler,
    backend: Arc<dyn ScheduleBackend>,
) -> Result<()> {
    let sender = events.sender();

    while app.running {
        terminal.draw(|f| ui::render(f, app)).map_err(tui_error)?;

        // The chart width is only known after a frame was laid out
        let area = app.chart_area.get();
        app.resize_chart(area);
        spawn_effects(app, &backend, &sender);

        let handled = match events.next()? {
            event::Event::Key(key) => actions::handle_key_event(app, key),
            event::Event::Mouse(mouse) => actions::handle_mouse_event(app, mouse),
            event::Event::FocusLost => {
                actions::cancel_drag(app);
                Ok(())
            }
            event::Event::Completed(completion) => {
                app.complete(completion);
                Ok(())
            }
            event::Event::DataChanged => {
                app.refresh();
                Ok(())
            }
            event::Event::Tick => {
                app.tick();
                Ok(())
            }
            event::Event::Resize(_, _) => Ok(()),
        };
        if let Err(e) = handled {
            tracing::warn!(error = %e, "input handling failed");
            app.set_status(e.to_string(), StatusKind::Error);
        }
        spawn_effects(app, &backend, &sender);
    }

    Ok(())
}

fn spawn_effects(app: &mut App, backend: &Arc<dyn ScheduleBackend>, sender: &Sender<event::Event>) {
    for effect in app.take_effects() {
        jobs::spawn(effect, Arc::clone(backend), sender.clone());
    }
}
