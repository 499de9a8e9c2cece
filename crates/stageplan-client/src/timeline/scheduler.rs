use std::borrow::Cow;

use chrono::{DateTime, Utc};
use stageplan_common::{ItemId, ScheduledItem};

use super::axis::TimeAxis;
use super::drag::{CommitRequest, DragController, DragOutcome};
use super::layout::{compute_layout, merge_overlay, Layout};
use super::window::TimeWindow;
use super::{TimelineError, TimelineResult};
use crate::storage::ScheduleBackend;

/// Work the host must perform against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist a finished drag, then reload the window
    Persist {
        request: CommitRequest,
        generation: u64,
        window: TimeWindow,
    },
    /// Reload the window
    Refetch { generation: u64, window: TimeWindow },
}

impl Effect {
    pub fn generation(&self) -> u64 {
        match self {
            Effect::Persist { generation, .. } | Effect::Refetch { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub item_id: ItemId,
    pub result: Result<(), String>,
    pub generation: u64,
    pub refreshed: Result<Vec<ScheduledItem>, String>,
}

/// Result of an executed [`Effect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Committed(CommitReport),
    Refreshed {
        generation: u64,
        result: Result<Vec<ScheduledItem>, String>,
    },
}

/// Run `effect` against `backend`. Blocking.
///
/// A persist always reloads afterwards, whether the update succeeded or not,
/// so the view resynchronizes either way.
pub fn execute(effect: Effect, backend: &dyn ScheduleBackend) -> Completion {
    match effect {
        Effect::Persist {
            request,
            generation,
            window,
        } => {
            let result = backend
                .update_item(request.item_id, &request.patch)
                .map(|_| ())
                .map_err(|e| e.to_string());
            let refreshed = backend
                .load_items(window.start, window.end)
                .map_err(|e| e.to_string());
            Completion::Committed(CommitReport {
                item_id: request.item_id,
                result,
                generation,
                refreshed,
            })
        }
        Effect::Refetch { generation, window } => Completion::Refreshed {
            generation,
            result: backend
                .load_items(window.start, window.end)
                .map_err(|e| e.to_string()),
        },
    }
}

/// What a pointer release turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerRelease {
    Selected(ItemId),
    Effect(Effect),
    Nothing,
}

/// Failure the user should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CommitFailed { item_id: ItemId, reason: String },
    RefreshFailed(String),
}

/// Owns the authoritative item list, the visible window and the drag state.
///
/// The item list is only ever replaced wholesale by backend data; in-flight
/// edits are layered on top at render time.
#[derive(Debug)]
pub struct Scheduler {
    items: Vec<ScheduledItem>,
    window: TimeWindow,
    drag: DragController,
    next_generation: u64,
    applied_generation: u64,
    followups: Vec<Effect>,
}

impl Scheduler {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            items: Vec::new(),
            window,
            drag: DragController::new(),
            next_generation: 0,
            applied_generation: 0,
            followups: Vec::new(),
        }
    }

    /// Authoritative items as last confirmed by the backend.
    pub fn items(&self) -> &[ScheduledItem] {
        &self.items
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Items as they should be drawn right now.
    pub fn rendered_items(&self) -> Cow<'_, [ScheduledItem]> {
        merge_overlay(&self.items, &self.drag.overlay())
    }

    pub fn layout(&self, now: DateTime<Utc>) -> TimelineResult<Layout> {
        compute_layout(&self.rendered_items(), &self.window, now)
    }

    pub fn set_window(&mut self, window: TimeWindow) -> Effect {
        self.window = window;
        self.request_refresh()
    }

    pub fn request_refresh(&mut self) -> Effect {
        Effect::Refetch {
            generation: self.bump_generation(),
            window: self.window,
        }
    }

    /// Press on item `item_id` at `x`. The drag snapshot is taken from the
    /// item as currently rendered.
    pub fn pointer_down(&mut self, item_id: ItemId, x: f64) -> TimelineResult<bool> {
        let axis = TimeAxis::new(&self.window)?;
        let rendered = self.rendered_items();
        let item = rendered
            .iter()
            .find(|item| item.id == item_id)
            .cloned()
            .ok_or(TimelineError::UnknownItem(item_id))?;
        drop(rendered);

        let Some(span) = axis.span(item.start, item.end) else {
            return Ok(false);
        };
        Ok(self.drag.pointer_down(&item, &span, x))
    }

    pub fn pointer_move(&mut self, x: f64) -> TimelineResult<bool> {
        if !self.drag.is_dragging() {
            return Ok(false);
        }
        let axis = TimeAxis::new(&self.window)?;
        Ok(self.drag.pointer_move(x, &axis))
    }

    pub fn pointer_up(&mut self, x: f64) -> PointerRelease {
        match self.drag.pointer_up(x) {
            DragOutcome::Click(item_id) => PointerRelease::Selected(item_id),
            DragOutcome::Commit(request) => PointerRelease::Effect(Effect::Persist {
                request,
                generation: self.bump_generation(),
                window: self.window,
            }),
            DragOutcome::Unchanged(_) | DragOutcome::Ignored => PointerRelease::Nothing,
        }
    }

    /// Abandon the active drag. The returned refetch resynchronizes the
    /// item that was being dragged.
    pub fn cancel(&mut self) -> Option<Effect> {
        let item_id = self.drag.cancel()?;
        let effect = self.request_refresh();
        self.drag.await_refetch(item_id, effect.generation());
        Some(effect)
    }

    pub fn complete(&mut self, completion: Completion) -> Option<Notice> {
        match completion {
            Completion::Committed(report) => self.commit_finished(report),
            Completion::Refreshed { generation, result } => self.refreshed(generation, result),
        }
    }

    pub fn commit_finished(&mut self, report: CommitReport) -> Option<Notice> {
        let CommitReport {
            item_id,
            result,
            generation,
            refreshed,
        } = report;

        let notice = match result {
            Ok(()) if generation < self.next_generation => {
                // Reloads issued after the release may have read the rows
                // before the update landed. Hold the live values until a
                // reload issued from here on is applied.
                let followup = self.request_refresh();
                tracing::info!(
                    item_id,
                    refetch = followup.generation(),
                    "edit committed, awaiting reload"
                );
                self.drag.await_refetch(item_id, followup.generation());
                self.followups.push(followup);
                None
            }
            Ok(()) => {
                self.drag.commit_finished(item_id, true);
                tracing::info!(item_id, "edit committed");
                None
            }
            Err(reason) => {
                self.drag.commit_finished(item_id, false);
                tracing::warn!(item_id, %reason, "commit failed, rolled back");
                self.drag.await_refetch(item_id, generation);
                Some(Notice::CommitFailed { item_id, reason })
            }
        };

        let refresh_notice = self.refreshed(generation, refreshed);
        notice.or(refresh_notice)
    }

    /// Apply a reload. Results older than the newest applied one are
    /// dropped.
    pub fn refreshed(
        &mut self,
        generation: u64,
        result: Result<Vec<ScheduledItem>, String>,
    ) -> Option<Notice> {
        let notice = match result {
            Ok(items) if generation > self.applied_generation => {
                tracing::debug!(generation, count = items.len(), "items refreshed");
                self.items = items;
                self.applied_generation = generation;
                None
            }
            Ok(_) => {
                tracing::debug!(
                    generation,
                    applied = self.applied_generation,
                    "stale refresh dropped"
                );
                None
            }
            Err(reason) => {
                tracing::warn!(generation, %reason, "refresh failed");
                Some(Notice::RefreshFailed(reason))
            }
        };

        self.drag.settle(generation.max(self.applied_generation));
        notice
    }

    /// Refetches the scheduler needs on its own, e.g. to confirm a commit
    /// that was overtaken by another reload.
    pub fn take_followups(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.followups)
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}
