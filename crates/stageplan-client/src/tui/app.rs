use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::Utc;
use ratatui::layout::Rect;

use crate::config::Config;
use crate::dock::{DockStack, StackingService};
use crate::error::Result;
use crate::timeline::{
    Completion, Effect, Layout, Notice, Resolution, Scheduler, TimeWindow, ViewportController,
};
use stageplan_common::{ItemId, ScheduledItem};

use super::theme::TuiTheme;

/// Columns reserved left of the chart for group and lane labels
pub const LABEL_WIDTH: u16 = 14;

/// Detail panels kept in the dock before the oldest is dropped
const DOCK_CAPACITY: usize = 9;

/// Main application state
pub struct App {
    /// Configuration
    pub config: Config,
    /// Where items are stored, shown in the header
    pub location: String,
    /// Theme colors for rendering
    pub theme: TuiTheme,
    /// Items, window and drag state
    pub scheduler: Scheduler,
    pub viewport: ViewportController,
    /// Layout of the current frame, recomputed after every change
    pub layout: Option<Layout>,
    pub selected: Option<ItemId>,
    /// Active popup
    pub popup: Option<PopupState>,
    /// Minimized detail panels
    pub dock: Box<dyn StackingService>,
    /// First chart row shown
    pub scroll: usize,
    /// Chart area of the last frame, including the label column and the
    /// axis header row
    pub chart_area: Cell<Rect>,
    /// Status message (success/error feedback)
    pub status_message: Option<StatusMessage>,
    /// Application running flag
    pub running: bool,
    effects: Vec<Effect>,
    in_flight: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Help,
    Detail(ItemId),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Info,
}

/// What a terminal row of the chart area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTarget {
    Header,
    Row(usize),
}

impl App {
    pub fn new(config: Config, location: String) -> Result<Self> {
        let settings = &config.timeline;
        let cell_px = f64::from(settings.cell_width_px);
        let viewport = ViewportController::new(80.0 * cell_px);

        let start = settings.resolution.floor(Utc::now());
        let seed = TimeWindow::new(
            start,
            start + chrono::Duration::days(i64::from(settings.span_days.max(1))),
            settings.resolution,
            settings.zoom,
        )?;
        let window = viewport.fit(&seed)?;

        let theme = TuiTheme::from(&config.theme.resolve());
        let mut app = Self {
            config,
            location,
            theme,
            scheduler: Scheduler::new(window),
            viewport,
            layout: None,
            selected: None,
            popup: None,
            dock: Box::new(DockStack::with_capacity(DOCK_CAPACITY)),
            scroll: 0,
            chart_area: Cell::new(Rect::default()),
            status_message: None,
            running: true,
            effects: Vec::new(),
            in_flight: 0,
        };
        app.refresh();
        Ok(app)
    }

    pub fn cell_width_px(&self) -> f64 {
        f64::from(self.config.timeline.cell_width_px)
    }

    pub fn window(&self) -> &TimeWindow {
        self.scheduler.window()
    }

    pub fn resolution(&self) -> Resolution {
        self.window().resolution
    }

    /// Queue backend work for the event loop.
    pub fn dispatch(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Hand queued work to the caller, counting it as in flight.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        let effects = std::mem::take(&mut self.effects);
        self.in_flight += effects.len();
        effects
    }

    /// Whether any backend job is still running
    pub fn is_syncing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn refresh(&mut self) {
        let effect = self.scheduler.request_refresh();
        self.dispatch(effect);
        self.relayout();
    }

    /// Apply a finished backend job.
    pub fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match self.scheduler.complete(completion) {
            Some(Notice::CommitFailed { item_id, reason }) => {
                self.set_status(
                    format!("Could not move item {}: {}", item_id, reason),
                    StatusKind::Error,
                );
            }
            Some(Notice::RefreshFailed(reason)) => {
                self.set_status(format!("Refresh failed: {}", reason), StatusKind::Error);
            }
            None => {}
        }
        for effect in self.scheduler.take_followups() {
            self.dispatch(effect);
        }
        self.relayout();
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        if window == *self.window() {
            return;
        }
        let effect = self.scheduler.set_window(window);
        self.dispatch(effect);
        self.relayout();
    }

    /// Track the chart width of the last frame, refitting the window when
    /// it changed.
    pub fn resize_chart(&mut self, area: Rect) {
        self.chart_area.set(area);
        let width_px = f64::from(area.width.saturating_sub(LABEL_WIDTH)) * self.cell_width_px();
        if width_px <= 0.0 || (width_px - self.viewport.width_px()).abs() < f64::EPSILON {
            return;
        }
        self.viewport.set_width(width_px);
        match self.viewport.fit(self.window()) {
            Ok(window) => self.set_window(window),
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    pub fn relayout(&mut self) {
        match self.scheduler.layout(Utc::now()) {
            Ok(layout) => self.layout = Some(layout),
            Err(e) => {
                self.layout = None;
                self.set_status(e.to_string(), StatusKind::Error);
            }
        }
        self.clamp_scroll();
    }

    /// Pixel offset of terminal column `column`, at the middle of its cell.
    pub fn column_to_x(&self, column: u16) -> Option<f64> {
        let area = self.chart_area.get();
        let left = area.x + LABEL_WIDTH;
        if column < left || column >= area.x + area.width {
            return None;
        }
        let cell = self.cell_width_px();
        Some(f64::from(column - left) * cell + cell / 2.0)
    }

    /// Like [`App::column_to_x`], but columns outside the chart are pinned
    /// to its nearest edge. Used while a pointer is captured.
    pub fn column_to_x_clamped(&self, column: u16) -> f64 {
        let area = self.chart_area.get();
        let left = area.x + LABEL_WIDTH;
        let right = (area.x + area.width).saturating_sub(1).max(left);
        let column = column.clamp(left, right);
        self.column_to_x(column).unwrap_or(0.0)
    }

    pub fn chart_target(&self, row: u16) -> Option<ChartTarget> {
        let area = self.chart_area.get();
        if row < area.y || row >= area.y + area.height {
            return None;
        }
        if row == area.y {
            return Some(ChartTarget::Header);
        }
        Some(ChartTarget::Row(usize::from(row - area.y - 1) + self.scroll))
    }

    /// Chart rows that fit below the axis header
    pub fn visible_rows(&self) -> usize {
        usize::from(self.chart_area.get().height.saturating_sub(1))
    }

    pub fn row_count(&self) -> usize {
        self.layout.as_ref().map_or(0, |layout| layout.rows().len())
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.row_count().saturating_sub(self.visible_rows().max(1));
        self.scroll = self.scroll.min(max);
    }

    /// Authoritative item by id
    pub fn item(&self, item_id: ItemId) -> Option<&ScheduledItem> {
        self.scheduler.items().iter().find(|item| item.id == item_id)
    }

    pub fn select(&mut self, item_id: ItemId) {
        self.selected = Some(item_id);
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    pub fn select_previous(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, step: isize) {
        let order = self
            .layout
            .as_ref()
            .map(|layout| layout.item_order())
            .unwrap_or_default();
        if order.is_empty() {
            return;
        }
        let next = match self
            .selected
            .and_then(|id| order.iter().position(|&o| o == id))
        {
            Some(pos) => pos.saturating_add_signed(step).min(order.len() - 1),
            None if step < 0 => order.len() - 1,
            None => 0,
        };
        self.select(order[next]);
    }

    fn scroll_to_selected(&mut self) {
        let Some(item_id) = self.selected else {
            return;
        };
        let Some(layout) = self.layout.as_ref() else {
            return;
        };
        let row = layout.rows().iter().position(|row| match row {
            crate::timeline::LayoutRow::Lane(items) => {
                items.iter().any(|rect| rect.item_id == item_id)
            }
            crate::timeline::LayoutRow::Group(_) => false,
        });
        let Some(row) = row else {
            return;
        };
        let visible = self.visible_rows().max(1);
        if row < self.scroll {
            self.scroll = row.saturating_sub(1);
        } else if row >= self.scroll + visible {
            self.scroll = row + 1 - visible;
        }
    }

    /// Open the detail panel for the selection.
    pub fn open_detail(&mut self) {
        if let Some(item_id) = self.selected {
            self.dock.remove(item_id);
            self.popup = Some(PopupState::Detail(item_id));
        }
    }

    /// Minimize the open detail panel into the dock.
    pub fn minimize_detail(&mut self) {
        if let Some(PopupState::Detail(item_id)) = self.popup {
            let slot = self.dock.push(item_id);
            self.popup = None;
            self.set_status(format!("Docked in slot {}", slot + 1), StatusKind::Info);
        }
    }

    /// Bring back the panel docked in `slot` (zero based).
    pub fn restore_docked(&mut self, slot: usize) {
        let Some(&item_id) = self.dock.entries().get(slot) else {
            return;
        };
        self.dock.remove(item_id);
        self.selected = Some(item_id);
        self.popup = Some(PopupState::Detail(item_id));
    }

    /// Set a status message that expires after 3 seconds
    pub fn set_status(&mut self, text: String, kind: StatusKind) {
        self.status_message = Some(StatusMessage {
            text,
            kind,
            expires_at: Instant::now() + Duration::from_secs(3),
        });
    }

    /// Update tick (for status message expiration and the now marker)
    pub fn tick(&mut self) {
        if let Some(ref msg) = self.status_message {
            if Instant::now() >= msg.expires_at {
                self.status_message = None;
            }
        }
        if !self.scheduler.drag().is_dragging() {
            self.relayout();
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}
