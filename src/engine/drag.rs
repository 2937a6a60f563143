//! Pointer-drag state machine for streams.
//!
//! A session is opened on pointer-down over a stream, updated on every
//! pointer move with provisional geometry, and closed on release or cancel.
//! Nothing is persisted while the session is live; closing it yields an
//! optional [`Commit`] describing the change to apply.

use chrono::{DateTime, Duration, Utc};
use egui::{Pos2, Vec2};
use uuid::Uuid;

use super::commit::Commit;
use super::layout;
use crate::model::{Project, TimeMapper, TimelineWindow, MIN_DURATION};

/// Vertical travel, in pixels, before a body drag turns into a reorder.
pub const REORDER_THRESHOLD_PX: f32 = 10.0;

/// Which part of the stream the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabKind {
    Body,
    StartHandle,
    EndHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    pub stream_id: Uuid,
    pub kind: GrabKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down on the body; no movement seen yet.
    Armed,
    Moving,
    ResizingStart,
    ResizingEnd,
    Reordering,
}

/// Live geometry of the dragged stream, for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPreview {
    pub stream_id: Uuid,
    pub phase: DragPhase,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_lane: usize,
    pub target_lane: usize,
}

impl DragPreview {
    /// Lane at which the stream at `index` should be drawn right now.
    pub fn lane_for(&self, index: usize) -> usize {
        if self.phase == DragPhase::Reordering {
            layout::displayed_lane(index, self.initial_lane, self.target_lane)
        } else {
            index
        }
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    stream_id: Uuid,
    phase: DragPhase,
    origin: Pos2,
    last_pointer: Pos2,
    mapper: TimeMapper,
    row_height: f32,
    lane_count: usize,
    initial_lane: usize,
    initial_start: DateTime<Utc>,
    initial_end: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    target_lane: usize,
}

impl DragSession {
    fn preview(&self) -> DragPreview {
        DragPreview {
            stream_id: self.stream_id,
            phase: self.phase,
            start: self.start,
            end: self.end,
            initial_lane: self.initial_lane,
            target_lane: self.target_lane,
        }
    }

    fn update(&mut self, pointer: Pos2) {
        let delta: Vec2 = pointer - self.origin;
        if delta == Vec2::ZERO && self.phase != DragPhase::Reordering {
            // Back at the origin: nothing is dragged, so nothing gets clamped.
            self.start = self.initial_start;
            self.end = self.initial_end;
            return;
        }
        let window = self.mapper.window();
        let dt = self.mapper.pixels_to_duration(delta.x);

        match self.phase {
            DragPhase::Armed | DragPhase::Moving => {
                if delta.y.abs() > delta.x.abs() && delta.y.abs() > REORDER_THRESHOLD_PX {
                    self.phase = DragPhase::Reordering;
                    self.start = self.initial_start;
                    self.end = self.initial_end;
                    self.target_lane = layout::target_lane(
                        self.initial_lane,
                        delta.y,
                        self.row_height,
                        self.lane_count,
                    );
                } else {
                    self.phase = DragPhase::Moving;
                    (self.start, self.end) =
                        move_span(self.initial_start, self.initial_end, dt, window);
                }
            }
            DragPhase::ResizingStart => {
                (self.start, self.end) =
                    resize_start(self.initial_start, self.initial_end, dt, window);
            }
            DragPhase::ResizingEnd => {
                (self.start, self.end) =
                    resize_end(self.initial_start, self.initial_end, dt, window);
            }
            DragPhase::Reordering => {
                self.target_lane = layout::target_lane(
                    self.initial_lane,
                    delta.y,
                    self.row_height,
                    self.lane_count,
                );
            }
            DragPhase::Idle => {}
        }
    }

    fn into_commit(self) -> Option<Commit> {
        match self.phase {
            DragPhase::Moving | DragPhase::ResizingStart | DragPhase::ResizingEnd => {
                let changed = self.start != self.initial_start || self.end != self.initial_end;
                changed.then_some(Commit::Reschedule {
                    stream_id: self.stream_id,
                    start: self.start,
                    end: self.end,
                })
            }
            DragPhase::Reordering => {
                (self.target_lane != self.initial_lane).then_some(Commit::Reorder {
                    stream_id: self.stream_id,
                    to: self.target_lane,
                })
            }
            DragPhase::Armed | DragPhase::Idle => None,
        }
    }
}

/// Owns the single live drag session, if any.
#[derive(Debug, Default)]
pub struct InteractionController {
    session: Option<DragSession>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        self.session.as_ref().map_or(DragPhase::Idle, |s| s.phase)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn preview(&self) -> Option<DragPreview> {
        self.session.as_ref().map(DragSession::preview)
    }

    /// Open a session for `grab`.
    ///
    /// Refused while another session is live, when the geometry is
    /// degenerate (`mapper` is `None`) or when the stream does not exist.
    pub fn begin(
        &mut self,
        grab: Grab,
        project: &Project,
        mapper: Option<TimeMapper>,
        pointer: Pos2,
        row_height: f32,
    ) -> bool {
        if self.session.is_some() {
            tracing::debug!(stream = %grab.stream_id, "ignoring pointer-down during an active drag");
            return false;
        }
        let Some(mapper) = mapper else {
            return false;
        };
        let Some(lane) = project.stream_index(grab.stream_id) else {
            tracing::debug!(stream = %grab.stream_id, "pointer-down on unknown stream");
            return false;
        };
        let stream = &project.streams[lane];
        let phase = match grab.kind {
            GrabKind::Body => DragPhase::Armed,
            GrabKind::StartHandle => DragPhase::ResizingStart,
            GrabKind::EndHandle => DragPhase::ResizingEnd,
        };
        tracing::debug!(stream = %stream.id, ?phase, lane, "drag started");

        self.session = Some(DragSession {
            stream_id: stream.id,
            phase,
            origin: pointer,
            last_pointer: pointer,
            mapper,
            row_height,
            lane_count: project.streams.len(),
            initial_lane: lane,
            initial_start: stream.start_date,
            initial_end: stream.end_date,
            start: stream.start_date,
            end: stream.end_date,
            target_lane: lane,
        });
        true
    }

    /// Feed a pointer position; returns the updated preview.
    ///
    /// A position equal to the last one fed leaves the session untouched.
    pub fn pointer_move(&mut self, pointer: Pos2) -> Option<DragPreview> {
        let session = self.session.as_mut()?;
        if pointer != session.last_pointer {
            session.last_pointer = pointer;
            session.update(pointer);
        }
        Some(session.preview())
    }

    /// Swap in the current geometry, e.g. after the panel was resized,
    /// and recompute the provisional bounds at the last pointer position.
    pub fn rescale(&mut self, mapper: TimeMapper) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.mapper != mapper {
            session.mapper = mapper;
            let pointer = session.last_pointer;
            session.update(pointer);
        }
    }

    /// Close the session on pointer release.
    pub fn pointer_up(&mut self) -> Option<Commit> {
        let session = self.session.take()?;
        tracing::debug!(stream = %session.stream_id, phase = ?session.phase, "drag released");
        session.into_commit()
    }

    /// Close the session after a cancel or lost capture. Same outcome as a release.
    pub fn pointer_cancel(&mut self) -> Option<Commit> {
        let session = self.session.take()?;
        tracing::debug!(stream = %session.stream_id, phase = ?session.phase, "drag cancelled");
        session.into_commit()
    }
}

/// Shift both bounds by `dt`, pinning to the window edge without changing the duration.
pub fn move_span(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    dt: Duration,
    window: TimelineWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let duration = end - start;
    let mut new_start = start + dt;
    let mut new_end = end + dt;
    if new_start < window.start {
        new_start = window.start;
        new_end = window.start + duration;
    } else if new_end > window.end {
        new_end = window.end;
        new_start = window.end - duration;
    }
    enforce_floor(new_start, new_end, window)
}

/// Move the start by `dt` within `[window.start, end - MIN_DURATION]`.
pub fn resize_start(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    dt: Duration,
    window: TimelineWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let new_start = (start + dt).max(window.start).min(end - MIN_DURATION);
    enforce_floor(new_start, end, window)
}

/// Move the end by `dt` within `[start + MIN_DURATION, window.end]`.
pub fn resize_end(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    dt: Duration,
    window: TimelineWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let new_end = (end + dt).min(window.end).max(start + MIN_DURATION);
    enforce_floor(start, new_end, window)
}

/// The duration floor wins over any requested geometry.
pub fn enforce_floor(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: TimelineWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    if end - start >= MIN_DURATION {
        return (start, end);
    }
    let end = (start + MIN_DURATION).min(window.end);
    let start = start.min(end - MIN_DURATION);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stream;
    use chrono::TimeZone;

    const ROW: f32 = 32.0;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    /// 28-day window over 280 px: one day is ten pixels.
    fn mapper() -> TimeMapper {
        TimeMapper::new(TimelineWindow::new(day(0), day(28)), 280.0).unwrap()
    }

    fn project() -> Project {
        let mut p = Project::new("P", day(0), day(28));
        p.streams = vec![
            Stream::new("A", day(2), day(5), 0),
            Stream::new("B", day(6), day(9), 1),
            Stream::new("C", day(10), day(14), 2),
        ];
        p
    }

    fn grab(p: &Project, index: usize, kind: GrabKind) -> Grab {
        Grab {
            stream_id: p.streams[index].id,
            kind,
        }
    }

    fn origin() -> Pos2 {
        Pos2::new(100.0, 50.0)
    }

    #[test]
    fn end_handle_drag_extends_end() {
        let p = project();
        let mut c = InteractionController::new();
        assert!(c.begin(grab(&p, 0, GrabKind::EndHandle), &p, Some(mapper()), origin(), ROW));
        assert_eq!(c.phase(), DragPhase::ResizingEnd);
        c.pointer_move(origin() + Vec2::new(100.0, 3.0));
        let commit = c.pointer_up().unwrap();
        assert_eq!(
            commit,
            Commit::Reschedule {
                stream_id: p.streams[0].id,
                start: day(2),
                end: day(15),
            }
        );
        assert_eq!(c.phase(), DragPhase::Idle);
    }

    #[test]
    fn resize_never_breaks_duration_floor() {
        let p = project();
        for kind in [GrabKind::StartHandle, GrabKind::EndHandle] {
            for dx in [-400.0, -35.0, -20.0, 0.5, 25.0, 60.0, 400.0] {
                let mut c = InteractionController::new();
                c.begin(grab(&p, 0, kind), &p, Some(mapper()), origin(), ROW);
                c.pointer_move(origin() + Vec2::new(dx, 0.0));
                if let Some(Commit::Reschedule { start, end, .. }) = c.pointer_up() {
                    assert!(end - start >= MIN_DURATION, "{kind:?} dx={dx}");
                }
            }
        }
    }

    #[test]
    fn start_handle_stops_one_day_before_end() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::StartHandle), &p, Some(mapper()), origin(), ROW);
        let preview = c.pointer_move(origin() + Vec2::new(200.0, 0.0)).unwrap();
        assert_eq!(preview.start, day(4));
        assert_eq!(preview.end, day(5));
        let preview = c.pointer_move(origin() + Vec2::new(-200.0, 0.0)).unwrap();
        assert_eq!(preview.start, day(0));
    }

    #[test]
    fn move_past_window_start_keeps_duration() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 2, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        c.pointer_move(origin() + Vec2::new(-500.0, 4.0));
        match c.pointer_up() {
            Some(Commit::Reschedule { start, end, .. }) => {
                assert_eq!(start, day(0));
                assert_eq!(end, day(4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn move_past_window_end_keeps_duration() {
        let (start, end) = move_span(day(20), day(25), Duration::days(10), mapper().window());
        assert_eq!((start, end), (day(23), day(28)));
    }

    #[test]
    fn vertical_drag_reorders() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 2, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        let preview = c.pointer_move(origin() + Vec2::new(2.0, -2.0 * ROW)).unwrap();
        assert_eq!(preview.phase, DragPhase::Reordering);
        assert_eq!(preview.target_lane, 0);
        assert_eq!(preview.lane_for(0), 1);
        assert_eq!(preview.lane_for(1), 2);
        assert_eq!(
            c.pointer_up(),
            Some(Commit::Reorder {
                stream_id: p.streams[2].id,
                to: 0,
            })
        );
    }

    #[test]
    fn small_vertical_jitter_stays_a_move() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 1, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        let preview = c.pointer_move(origin() + Vec2::new(3.0, 8.0)).unwrap();
        assert_eq!(preview.phase, DragPhase::Moving);
        assert_eq!(preview.lane_for(0), 0);
    }

    #[test]
    fn move_promotes_to_reorder_and_resets_dates() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        c.pointer_move(origin() + Vec2::new(5.0, 0.0));
        let preview = c.pointer_move(origin() + Vec2::new(5.0, 40.0)).unwrap();
        assert_eq!(preview.phase, DragPhase::Reordering);
        assert_eq!((preview.start, preview.end), (day(2), day(5)));
    }

    #[test]
    fn release_without_change_commits_nothing() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        assert_eq!(c.pointer_up(), None);

        c.begin(grab(&p, 1, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        c.pointer_move(origin() + Vec2::new(0.0, 14.0));
        assert_eq!(c.phase(), DragPhase::Reordering);
        assert_eq!(c.pointer_up(), None);
    }

    #[test]
    fn cancel_finalizes_like_release() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        c.pointer_move(origin() + Vec2::new(30.0, 0.0));
        assert_eq!(
            c.pointer_cancel(),
            Some(Commit::Reschedule {
                stream_id: p.streams[0].id,
                start: day(5),
                end: day(8),
            })
        );
        assert!(!c.is_active());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let p = project();
        let mut c = InteractionController::new();
        assert!(c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW));
        assert!(!c.begin(grab(&p, 1, GrabKind::EndHandle), &p, Some(mapper()), origin(), ROW));
        assert_eq!(c.preview().unwrap().stream_id, p.streams[0].id);
    }

    #[test]
    fn invalid_targets_never_start() {
        let p = project();
        let mut c = InteractionController::new();
        let ghost = Grab {
            stream_id: Uuid::new_v4(),
            kind: GrabKind::Body,
        };
        assert!(!c.begin(ghost, &p, Some(mapper()), origin(), ROW));
        assert!(!c.begin(grab(&p, 0, GrabKind::Body), &p, None, origin(), ROW));
        assert_eq!(c.phase(), DragPhase::Idle);
        assert_eq!(c.pointer_move(origin()), None);
        assert_eq!(c.pointer_up(), None);
    }

    #[test]
    fn click_without_movement_keeps_dates_outside_the_window() {
        let mut p = project();
        p.streams[0].set_span(day(-5), day(3));
        for kind in [GrabKind::Body, GrabKind::StartHandle, GrabKind::EndHandle] {
            let mut c = InteractionController::new();
            c.begin(grab(&p, 0, kind), &p, Some(mapper()), origin(), ROW);
            c.pointer_move(origin());
            c.pointer_move(origin());
            assert_eq!(c.pointer_up(), None, "{kind:?}");
        }
    }

    #[test]
    fn returning_to_origin_restores_initial_dates() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        c.pointer_move(origin() + Vec2::new(40.0, 0.0));
        let preview = c.pointer_move(origin()).unwrap();
        assert_eq!((preview.start, preview.end), (day(2), day(5)));
        assert_eq!(c.pointer_up(), None);
    }

    #[test]
    fn rescale_recomputes_at_the_last_pointer() {
        let p = project();
        let mut c = InteractionController::new();
        c.begin(grab(&p, 0, GrabKind::Body), &p, Some(mapper()), origin(), ROW);
        // 10 px per day at 280 px wide.
        let preview = c.pointer_move(origin() + Vec2::new(30.0, 0.0)).unwrap();
        assert_eq!(preview.start, day(5));
        // Half the width: the same 30 px now spans 6 days.
        let narrow = TimeMapper::new(mapper().window(), 140.0).unwrap();
        c.rescale(narrow);
        let preview = c.preview().unwrap();
        assert_eq!((preview.start, preview.end), (day(8), day(11)));
    }

    #[test]
    fn floor_reclamps_start_at_window_end() {
        let w = mapper().window();
        let (start, end) = enforce_floor(day(28), day(28), w);
        assert_eq!((start, end), (day(27), day(28)));
    }
}
