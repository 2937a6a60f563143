//! Deadline flags on streams.
//!
//! Flags are never dragged. They are added at a point in time, edited by
//! clicking, and only drawn while their date lies inside the window.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Deadline, Project, TimeMapper};

/// Append a flag with an empty comment to `stream_id`.
pub fn add_deadline(project: &mut Project, stream_id: Uuid, date: DateTime<Utc>) -> Option<Uuid> {
    let stream = project.stream_mut(stream_id)?;
    let deadline = Deadline::new(date);
    let id = deadline.id;
    stream.deadlines.push(deadline);
    Some(id)
}

/// Replace a flag's comment with the trimmed `text`, flattened to one line.
/// Empty text is kept as-is.
pub fn edit_comment(project: &mut Project, deadline_id: Uuid, text: &str) -> bool {
    match project.deadline_mut(deadline_id) {
        Some(deadline) => {
            deadline.comment = text.trim().replace(['\r', '\n'], " ");
            true
        }
        None => false,
    }
}

pub fn remove_deadline(project: &mut Project, deadline_id: Uuid) -> bool {
    for stream in &mut project.streams {
        if let Some(index) = stream.deadlines.iter().position(|d| d.id == deadline_id) {
            stream.deadlines.remove(index);
            return true;
        }
    }
    false
}

/// Horizontal position of a flag, or `None` when it falls outside the window.
pub fn marker_fraction(deadline: &Deadline, mapper: &TimeMapper) -> Option<f64> {
    mapper
        .window()
        .contains(deadline.date)
        .then(|| mapper.time_to_fraction(deadline.date))
}
