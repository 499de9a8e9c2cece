use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use stageplan_common::{ItemId, ItemPatch, ScheduledItem};

use super::axis::{AxisDelta, Span, TimeAxis};
use super::layout::Overlay;

/// Pointer distance from an item edge that grabs the edge instead of the
/// whole item. Constant in pixels, whatever the zoom.
pub const EDGE_HANDLE_PX: f64 = 8.0;

/// Net horizontal movement below which a press/release pair is a click.
pub const CLICK_SLOP_PX: f64 = 3.0;

type Interval = (DateTime<Utc>, DateTime<Utc>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    MoveStart,
    MoveEnd,
    MoveWhole,
}

impl DragMode {
    /// Pick the mode from where the pointer landed on the rendered item.
    pub fn for_pointer(x: f64, span: &Span) -> Self {
        if x - span.x <= EDGE_HANDLE_PX && !span.clipped_left {
            DragMode::MoveStart
        } else if span.right() - x <= EDGE_HANDLE_PX && !span.clipped_right {
            DragMode::MoveEnd
        } else {
            DragMode::MoveWhole
        }
    }
}

/// Pointer subscription held for the lifetime of a drag session.
///
/// Released on drop, so every way out of `Dragging` gives it back.
#[derive(Debug)]
pub struct PointerCapture {
    held: Rc<Cell<usize>>,
    item_id: ItemId,
}

impl PointerCapture {
    fn acquire(held: &Rc<Cell<usize>>, item_id: ItemId) -> Self {
        held.set(held.get() + 1);
        tracing::trace!(item_id, "pointer captured");
        Self {
            held: Rc::clone(held),
            item_id,
        }
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        self.held.set(self.held.get().saturating_sub(1));
        tracing::trace!(item_id = self.item_id, "pointer released");
    }
}

/// In-progress pointer edit of one item.
#[derive(Debug)]
pub struct DragSession {
    pub item_id: ItemId,
    pub mode: DragMode,
    pub anchor_x: f64,
    pub original_start: DateTime<Utc>,
    pub original_end: DateTime<Utc>,
    pub live_start: DateTime<Utc>,
    pub live_end: DateTime<Utc>,
    _capture: PointerCapture,
}

impl DragSession {
    pub fn original(&self) -> Interval {
        (self.original_start, self.original_end)
    }

    pub fn live(&self) -> Interval {
        (self.live_start, self.live_end)
    }

    /// Apply `delta` (measured from the anchor) to the live interval.
    ///
    /// Edits that would make the interval empty or inverted are dropped and
    /// the previous live value is kept.
    fn apply(&mut self, delta: AxisDelta) -> bool {
        let before = self.live();
        match self.mode {
            DragMode::MoveStart => {
                if let Some(start) = delta.apply(self.original_start) {
                    if start < self.live_end {
                        self.live_start = start;
                    }
                }
            }
            DragMode::MoveEnd => {
                if let Some(end) = delta.apply(self.original_end) {
                    if end > self.live_start {
                        self.live_end = end;
                    }
                }
            }
            DragMode::MoveWhole => {
                let duration = self.original_end - self.original_start;
                let moved = delta
                    .apply(self.original_start)
                    .and_then(|start| start.checked_add_signed(duration).map(|end| (start, end)));
                if let Some((start, end)) = moved {
                    self.live_start = start;
                    self.live_end = end;
                }
            }
        }
        self.live() != before
    }
}

/// Edit sent to persistence, or being rolled back after a failed commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub item_id: ItemId,
    pub original: Interval,
    pub live: Interval,
    /// Refetch generation that resynchronizes a rollback
    pub refetch: Option<u64>,
}

#[derive(Debug)]
pub enum DragState {
    Idle,
    Dragging(DragSession),
    Committing(PendingEdit),
    RollingBack(PendingEdit),
}

/// Payload-free view of [`DragState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    Committing,
    RollingBack,
}

impl DragState {
    pub fn phase(&self) -> DragPhase {
        match self {
            DragState::Idle => DragPhase::Idle,
            DragState::Dragging(_) => DragPhase::Dragging,
            DragState::Committing(_) => DragPhase::Committing,
            DragState::RollingBack(_) => DragPhase::RollingBack,
        }
    }

    fn overlay(&self) -> Option<Overlay> {
        let (item_id, (start, end)) = match self {
            DragState::Idle => return None,
            DragState::Dragging(session) => (session.item_id, session.live()),
            DragState::Committing(edit) => (edit.item_id, edit.live),
            DragState::RollingBack(edit) => (edit.item_id, edit.original),
        };
        Some(Overlay {
            item_id,
            start,
            end,
        })
    }
}

/// Final values of a drag, to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub item_id: ItemId,
    pub patch: ItemPatch,
    pub original: Interval,
    pub live: Interval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Press and release without meaningful movement: select the item
    Click(ItemId),
    /// The interval changed and must be persisted
    Commit(CommitRequest),
    /// The pointer moved but every step was rejected
    Unchanged(ItemId),
    /// No drag was active
    Ignored,
}

/// Drag state per item. Items without an entry are idle.
#[derive(Debug, Default)]
pub struct DragController {
    states: BTreeMap<ItemId, DragState>,
    captures: Rc<Cell<usize>>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, item_id: ItemId) -> DragPhase {
        self.states
            .get(&item_id)
            .map_or(DragPhase::Idle, DragState::phase)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.states.values().find_map(|state| match state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.session().is_some()
    }

    /// Pointer subscriptions currently held. At most one.
    pub fn captures_held(&self) -> usize {
        self.captures.get()
    }

    /// Items with an edit in flight (committing or rolling back)
    pub fn pending(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, DragState::Committing(_) | DragState::RollingBack(_)))
            .count()
    }

    /// Intervals to render in place of authoritative values.
    pub fn overlay(&self) -> Vec<Overlay> {
        self.states.values().filter_map(DragState::overlay).collect()
    }

    /// Start dragging `item` (as currently rendered, at `span`).
    ///
    /// Refused while another drag is active, while this item still has an
    /// edit in flight, and for zero-length items, which have no valid live
    /// interval to start from.
    pub fn pointer_down(&mut self, item: &ScheduledItem, span: &Span, x: f64) -> bool {
        if self.is_dragging() || self.states.contains_key(&item.id) {
            tracing::debug!(item_id = item.id, "drag refused: edit already active");
            return false;
        }
        if item.start >= item.end {
            tracing::debug!(item_id = item.id, "drag refused: zero-length item");
            return false;
        }

        let mode = DragMode::for_pointer(x, span);
        let session = DragSession {
            item_id: item.id,
            mode,
            anchor_x: x,
            original_start: item.start,
            original_end: item.end,
            live_start: item.start,
            live_end: item.end,
            _capture: PointerCapture::acquire(&self.captures, item.id),
        };
        tracing::debug!(item_id = item.id, ?mode, anchor_x = x, "drag started");
        self.states.insert(item.id, DragState::Dragging(session));
        true
    }

    /// Update the live interval for a pointer at `x`. Returns whether the
    /// overlay changed.
    pub fn pointer_move(&mut self, x: f64, axis: &TimeAxis) -> bool {
        let Some(session) = self.session_mut() else {
            return false;
        };
        let delta = axis.delta_for(x - session.anchor_x);
        session.apply(delta)
    }

    /// Finish the active drag.
    pub fn pointer_up(&mut self, x: f64) -> DragOutcome {
        let Some(item_id) = self.session().map(|s| s.item_id) else {
            return DragOutcome::Ignored;
        };
        let Some(DragState::Dragging(session)) = self.states.remove(&item_id) else {
            return DragOutcome::Ignored;
        };

        if (x - session.anchor_x).abs() < CLICK_SLOP_PX {
            tracing::debug!(item_id, "drag reinterpreted as click");
            return DragOutcome::Click(item_id);
        }

        let (original, live) = (session.original(), session.live());
        if original == live {
            return DragOutcome::Unchanged(item_id);
        }

        let request = CommitRequest {
            item_id,
            patch: ItemPatch::between(original, live),
            original,
            live,
        };
        tracing::debug!(item_id, ?live, "drag released, committing");
        self.states.insert(
            item_id,
            DragState::Committing(PendingEdit {
                item_id,
                original,
                live,
                refetch: None,
            }),
        );
        DragOutcome::Commit(request)
    }

    /// Abandon the active drag, e.g. on Escape or when pointer capture is
    /// lost. Returns the item that must be resynchronized.
    pub fn cancel(&mut self) -> Option<ItemId> {
        let item_id = self.session().map(|s| s.item_id)?;
        if let Some(DragState::Dragging(session)) = self.states.remove(&item_id) {
            tracing::debug!(item_id, "drag cancelled, rolling back");
            self.states.insert(
                item_id,
                DragState::RollingBack(PendingEdit {
                    item_id,
                    original: session.original(),
                    live: session.live(),
                    refetch: None,
                }),
            );
        }
        Some(item_id)
    }

    /// Record the persistence result for `item_id`.
    pub fn commit_finished(&mut self, item_id: ItemId, succeeded: bool) {
        match self.states.remove(&item_id) {
            Some(DragState::Committing(edit)) if !succeeded => {
                tracing::debug!(item_id, "commit failed, rolling back");
                self.states.insert(item_id, DragState::RollingBack(edit));
            }
            Some(DragState::Committing(_)) => {
                tracing::debug!(item_id, "commit confirmed");
            }
            Some(other) => {
                // Not ours to resolve; put it back.
                self.states.insert(item_id, other);
            }
            None => {}
        }
    }

    /// Tie a pending edit to the refetch that will resynchronize it.
    ///
    /// A committing edit tied this way is confirmed by persistence and only
    /// waits for a reload that is known to include it.
    pub fn await_refetch(&mut self, item_id: ItemId, generation: u64) {
        match self.states.get_mut(&item_id) {
            Some(DragState::RollingBack(edit)) | Some(DragState::Committing(edit)) => {
                edit.refetch = Some(generation);
            }
            _ => {}
        }
    }

    /// Return pending items to idle once a refetch at or after their
    /// resynchronizing generation has landed.
    pub fn settle(&mut self, generation: u64) -> Vec<ItemId> {
        let settled: Vec<ItemId> = self
            .states
            .iter()
            .filter_map(|(id, state)| match state {
                DragState::RollingBack(PendingEdit {
                    refetch: Some(g), ..
                })
                | DragState::Committing(PendingEdit {
                    refetch: Some(g), ..
                }) if *g <= generation => Some(*id),
                _ => None,
            })
            .collect();
        for id in &settled {
            self.states.remove(id);
        }
        settled
    }

    fn session_mut(&mut self) -> Option<&mut DragSession> {
        self.states.values_mut().find_map(|state| match state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Resolution, TimeWindow, ZoomLevel};
    use chrono::{Duration, TimeZone};

    fn jan(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0).unwrap()
    }

    fn dec(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, d, 0, 0, 0).unwrap()
    }

    /// Day resolution at 100px per day, starting Dec 20
    fn axis() -> TimeAxis {
        let window =
            TimeWindow::new(dec(20), jan(31), Resolution::Day, ZoomLevel::default()).unwrap();
        TimeAxis::new(&window).unwrap()
    }

    fn item(start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledItem {
        ScheduledItem::new(42, "stage", "Build", start, end).unwrap()
    }

    fn grab(controller: &mut DragController, item: &ScheduledItem, x: f64) -> Span {
        let span = axis().span(item.start, item.end).unwrap();
        assert!(controller.pointer_down(item, &span, x));
        span
    }

    #[test]
    fn test_mode_selected_by_edge_distance() {
        let span = Span {
            x: 100.0,
            width: 200.0,
            clipped_left: false,
            clipped_right: false,
        };
        assert_eq!(DragMode::for_pointer(104.0, &span), DragMode::MoveStart);
        assert_eq!(DragMode::for_pointer(295.0, &span), DragMode::MoveEnd);
        assert_eq!(DragMode::for_pointer(200.0, &span), DragMode::MoveWhole);
    }

    #[test]
    fn test_clipped_edges_have_no_handle() {
        let span = Span {
            x: 0.0,
            width: 200.0,
            clipped_left: true,
            clipped_right: false,
        };
        assert_eq!(DragMode::for_pointer(2.0, &span), DragMode::MoveWhole);
    }

    #[test]
    fn test_zero_length_item_is_not_draggable() {
        let mut controller = DragController::new();
        let milestone = item(jan(2), jan(2));
        let span = axis().span(milestone.start, milestone.end).unwrap();
        assert!(!controller.pointer_down(&milestone, &span, span.x));
        assert_eq!(controller.phase(42), DragPhase::Idle);
        assert_eq!(controller.captures_held(), 0);
        assert_eq!(controller.pointer_up(span.x + 50.0), DragOutcome::Ignored);
    }

    #[test]
    fn test_move_start_clamps_before_end() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(5));
        let span = axis().span(item.start, item.end).unwrap();
        let x0 = span.x + 1.0;
        assert!(controller.pointer_down(&item, &span, x0));
        assert_eq!(controller.session().map(|s| s.mode), Some(DragMode::MoveStart));

        // Three days later is fine
        controller.pointer_move(x0 + 300.0, &axis());
        assert_eq!(controller.session().unwrap().live_start, jan(4));

        // Pushing onto or past the end is rejected and the last valid value sticks
        controller.pointer_move(x0 + 500.0, &axis());
        assert_eq!(controller.session().unwrap().live_start, jan(4));
        controller.pointer_move(x0 + 400.0, &axis());
        assert_eq!(controller.session().unwrap().live_start, jan(4));
    }

    #[test]
    fn test_move_end_rejects_crossing_start() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(5));
        let span = axis().span(item.start, item.end).unwrap();
        let x0 = span.right() - 1.0;
        assert!(controller.pointer_down(&item, &span, x0));
        assert_eq!(controller.session().map(|s| s.mode), Some(DragMode::MoveEnd));

        // Ten days back would land on Dec 26, before the start
        controller.pointer_move(x0 - 1000.0, &axis());
        let session = controller.session().unwrap();
        assert_eq!(session.live_end, jan(5));
        assert_eq!(session.live_start, jan(1));

        controller.pointer_move(x0 - 100.0, &axis());
        assert_eq!(controller.session().unwrap().live_end, jan(4));
        controller.pointer_move(x0 - 1000.0, &axis());
        assert_eq!(controller.session().unwrap().live_end, jan(4));
    }

    #[test]
    fn test_move_whole_preserves_duration() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(3) + Duration::hours(5));
        let span = axis().span(item.start, item.end).unwrap();
        let x0 = span.x + span.width / 2.0;
        assert!(controller.pointer_down(&item, &span, x0));

        for dx in [13.0, 57.5, -240.0, 401.0, 999.9, -3.3] {
            controller.pointer_move(x0 + dx, &axis());
            let session = controller.session().unwrap();
            assert_eq!(session.mode, DragMode::MoveWhole);
            assert_eq!(session.live_end - session.live_start, item.duration());
        }
    }

    #[test]
    fn test_only_one_drag_at_a_time() {
        let mut controller = DragController::new();
        let a = item(jan(1), jan(3));
        let mut b = item(jan(5), jan(6));
        b.id = 7;
        let span_b = axis().span(b.start, b.end).unwrap();
        grab(&mut controller, &a, 1300.0);
        assert!(!controller.pointer_down(&b, &span_b, span_b.x + 20.0));
        assert_eq!(controller.captures_held(), 1);
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(5));
        grab(&mut controller, &item, 1400.0);
        controller.pointer_move(1401.0, &axis());
        assert_eq!(controller.pointer_up(1402.0), DragOutcome::Click(42));
        assert_eq!(controller.phase(42), DragPhase::Idle);
        assert_eq!(controller.captures_held(), 0);
        assert!(controller.overlay().is_empty());
    }

    #[test]
    fn test_release_commits_live_values() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(3));
        grab(&mut controller, &item, 1300.0);
        controller.pointer_move(1700.0, &axis());
        let DragOutcome::Commit(request) = controller.pointer_up(1700.0) else {
            panic!("expected a commit");
        };
        assert_eq!(request.live, (jan(5), jan(7)));
        assert_eq!(request.patch.start, Some(jan(5)));
        assert_eq!(controller.phase(42), DragPhase::Committing);
        assert_eq!(controller.captures_held(), 0);

        // Still rendered at the live position while the commit is pending
        assert_eq!(
            controller.overlay(),
            vec![Overlay {
                item_id: 42,
                start: jan(5),
                end: jan(7)
            }]
        );

        // The same item cannot be grabbed until the commit resolves
        let span = axis().span(jan(5), jan(7)).unwrap();
        assert!(!controller.pointer_down(&item, &span, 1750.0));

        controller.commit_finished(42, true);
        assert_eq!(controller.phase(42), DragPhase::Idle);
        assert!(controller.overlay().is_empty());
    }

    #[test]
    fn test_failed_commit_rolls_back_to_snapshot() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(3));
        grab(&mut controller, &item, 1300.0);
        controller.pointer_move(1700.0, &axis());
        controller.pointer_up(1700.0);

        controller.commit_finished(42, false);
        assert_eq!(controller.phase(42), DragPhase::RollingBack);
        assert_eq!(controller.overlay()[0].start, jan(1));
        assert_eq!(controller.overlay()[0].end, jan(3));

        controller.await_refetch(42, 3);
        assert!(controller.settle(2).is_empty());
        assert_eq!(controller.settle(3), vec![42]);
        assert_eq!(controller.phase(42), DragPhase::Idle);
    }

    #[test]
    fn test_cancel_releases_capture_and_restores() {
        let mut controller = DragController::new();
        let item = item(jan(1), jan(3));
        grab(&mut controller, &item, 1300.0);
        controller.pointer_move(1900.0, &axis());
        assert_eq!(controller.cancel(), Some(42));
        assert_eq!(controller.captures_held(), 0);
        assert_eq!(controller.phase(42), DragPhase::RollingBack);
        assert_eq!(controller.overlay()[0].start, jan(1));
        assert_eq!(controller.pointer_up(1900.0), DragOutcome::Ignored);
    }

    #[test]
    fn test_other_items_draggable_while_committing() {
        let mut controller = DragController::new();
        let a = item(jan(1), jan(3));
        let mut b = item(jan(5), jan(6));
        b.id = 7;
        grab(&mut controller, &a, 1300.0);
        controller.pointer_move(1500.0, &axis());
        controller.pointer_up(1500.0);

        let span_b = axis().span(b.start, b.end).unwrap();
        assert!(controller.pointer_down(&b, &span_b, span_b.x + 50.0));
        assert_eq!(controller.pending(), 1);
    }
}
