//! What a pointer lands on, and what right-clicking it does.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::drag::{Grab, GrabKind};
use crate::model::{Deadline, Project, Stream, TimeMapper, DEFAULT_STREAM_DURATION, MIN_DURATION};

/// The element under the pointer inside the lane area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Free space; `lane` may be one past the last stream.
    Empty { lane: usize, fraction: f64 },
    Body { stream_id: Uuid, fraction: f64 },
    Label(Uuid),
    StartHandle(Uuid),
    EndHandle(Uuid),
    Marker { stream_id: Uuid, deadline_id: Uuid },
}

impl HitTarget {
    /// The drag a primary press on this target starts, if any.
    pub fn grab(&self) -> Option<Grab> {
        let (stream_id, kind) = match *self {
            HitTarget::Body { stream_id, .. } => (stream_id, GrabKind::Body),
            HitTarget::StartHandle(id) => (id, GrabKind::StartHandle),
            HitTarget::EndHandle(id) => (id, GrabKind::EndHandle),
            _ => return None,
        };
        Some(Grab { stream_id, kind })
    }
}

/// Result of a right-click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextAction {
    CreateStream { lane: usize, at: DateTime<Utc> },
    /// Palette menu for a stream; `at` is where a flag would be added from it.
    ColorMenu { stream_id: Uuid, at: DateTime<Utc> },
    None,
}

/// Right-click on empty space creates a stream; on a stream body it opens the color menu.
pub fn context_action(target: HitTarget, mapper: &TimeMapper) -> ContextAction {
    match target {
        HitTarget::Empty { lane, fraction } => ContextAction::CreateStream {
            lane,
            at: mapper.fraction_to_time(fraction),
        },
        HitTarget::Body {
            stream_id,
            fraction,
        } => ContextAction::ColorMenu {
            stream_id,
            at: mapper.fraction_to_time(fraction),
        },
        _ => ContextAction::None,
    }
}

/// Create a week-long stream centred on `at`, inside the project's own range,
/// carrying one flag at `at`, and insert it at `lane`.
pub fn create_stream_at(project: &mut Project, at: DateTime<Utc>, lane: usize) -> Uuid {
    let half = DEFAULT_STREAM_DURATION / 2;
    let mut start = at - half;
    let mut end = at + half;
    if start < project.start_date {
        start = project.start_date;
        end = start + DEFAULT_STREAM_DURATION;
    }
    if end > project.end_date {
        end = project.end_date;
        start = (end - DEFAULT_STREAM_DURATION).max(project.start_date);
    }
    if end - start < MIN_DURATION {
        end = start + MIN_DURATION;
    }

    let label = format!("Stream {}", project.streams.len() + 1);
    let mut stream = Stream::new(label, start, end, project.next_color());
    stream.deadlines.push(Deadline::new(at));
    let id = stream.id;
    let lane = lane.min(project.streams.len());
    tracing::debug!(stream = %id, lane, "creating stream");
    project.streams.insert(lane, stream);
    id
}

pub fn set_stream_color(project: &mut Project, stream_id: Uuid, color: usize) -> bool {
    match project.stream_mut(stream_id) {
        Some(stream) => {
            stream.set_color(color);
            true
        }
        None => false,
    }
}

/// Rename a stream. Blank labels fall back to "Stream".
pub fn rename_stream(project: &mut Project, stream_id: Uuid, label: &str) -> bool {
    let Some(stream) = project.stream_mut(stream_id) else {
        return false;
    };
    let label = label.trim();
    stream.label = if label.is_empty() {
        "Stream".to_string()
    } else {
        label.to_string()
    };
    true
}

/// Set both bounds from an editor, keeping the duration floor.
pub fn reschedule_stream(
    project: &mut Project,
    stream_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    match project.stream_mut(stream_id) {
        Some(stream) => {
            stream.set_span(start, end.max(start));
            true
        }
        None => false,
    }
}
