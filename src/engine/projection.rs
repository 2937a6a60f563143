//! Pure projection of streams into lane-area geometry.
//!
//! Positions are fractions of the lane-area width so the same bars can be
//! painted at any size; hit-testing runs against the same numbers.

use chrono::{DateTime, Utc};
use egui::Vec2;
use uuid::Uuid;

use super::context::HitTarget;
use super::deadline::marker_fraction;
use super::drag::{enforce_floor, DragPreview};
use super::layout;
use crate::model::{Project, Stream, TimeMapper, TimelineWindow};

/// Pixel sizes of the lane area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneMetrics {
    pub row_height: f32,
    /// Vertical gap between the row edge and the bar.
    pub bar_inset: f32,
    pub handle_width: f32,
    /// Width reserved for the label at the left of a bar.
    pub label_width: f32,
    /// Side of the square hit box around a flag.
    pub marker_size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub deadline_id: Uuid,
    pub fraction: f64,
    pub comment: String,
}

/// Everything the painter needs for one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamBar {
    pub stream_id: Uuid,
    pub lane: usize,
    pub label: String,
    pub range_text: String,
    pub color: usize,
    pub start_fraction: f64,
    pub end_fraction: f64,
    pub markers: Vec<MarkerView>,
    /// Flags outside the window; kept on the stream, not drawn.
    pub hidden_markers: usize,
    pub dragging: bool,
}

/// Clamp a span into the window without letting it shrink below the floor.
pub fn displayed_span(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window: TimelineWindow,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = window.clamp(start);
    let end = window.clamp(end);
    enforce_floor(start, end, window)
}

pub fn range_text(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{} – {}", start.format("%b %d"), end.format("%b %d"))
}

/// Project one stream drawn at `lane`, optionally with provisional bounds.
pub fn project_stream(
    stream: &Stream,
    lane: usize,
    mapper: &TimeMapper,
    span: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> StreamBar {
    let (start, end) = span.unwrap_or((stream.start_date, stream.end_date));
    let (shown_start, shown_end) = displayed_span(start, end, mapper.window());

    let mut markers = Vec::new();
    let mut hidden_markers = 0;
    for deadline in &stream.deadlines {
        match marker_fraction(deadline, mapper) {
            Some(fraction) => markers.push(MarkerView {
                deadline_id: deadline.id,
                fraction,
                comment: deadline.comment.clone(),
            }),
            None => hidden_markers += 1,
        }
    }

    StreamBar {
        stream_id: stream.id,
        lane,
        label: stream.label.clone(),
        range_text: range_text(start, end),
        color: stream.color,
        start_fraction: mapper.time_to_fraction(shown_start),
        end_fraction: mapper.time_to_fraction(shown_end),
        markers,
        hidden_markers,
        dragging: span.is_some(),
    }
}

/// Project every stream, applying the live drag preview when there is one.
pub fn project_streams(
    project: &Project,
    mapper: &TimeMapper,
    preview: Option<&DragPreview>,
) -> Vec<StreamBar> {
    project
        .streams
        .iter()
        .enumerate()
        .map(|(index, stream)| match preview {
            Some(p) if p.stream_id == stream.id => {
                project_stream(stream, p.lane_for(index), mapper, Some((p.start, p.end)))
            }
            Some(p) => project_stream(stream, p.lane_for(index), mapper, None),
            None => project_stream(stream, index, mapper, None),
        })
        .collect()
}

/// Find what lies under `pos`, given relative to the lane area's top-left corner.
pub fn hit_test(bars: &[StreamBar], metrics: &LaneMetrics, width: f32, pos: Vec2) -> HitTarget {
    let fraction = if width > 0.0 {
        (pos.x as f64 / width as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    for bar in bars {
        let top = layout::lane_top(bar.lane, metrics.row_height);
        if pos.y < top || pos.y >= top + metrics.row_height {
            continue;
        }

        for marker in &bar.markers {
            let x = marker.fraction as f32 * width;
            if (pos.x - x).abs() <= metrics.marker_size / 2.0 && pos.y <= top + metrics.marker_size {
                return HitTarget::Marker {
                    stream_id: bar.stream_id,
                    deadline_id: marker.deadline_id,
                };
            }
        }

        let x0 = bar.start_fraction as f32 * width;
        let x1 = bar.end_fraction as f32 * width;
        let in_bar_rows = pos.y >= top + metrics.bar_inset && pos.y <= top + metrics.row_height - metrics.bar_inset;
        let half = metrics.handle_width / 2.0;
        if !in_bar_rows || pos.x < x0 - half || pos.x > x1 + half {
            continue;
        }
        if (pos.x - x0).abs() <= half {
            return HitTarget::StartHandle(bar.stream_id);
        }
        if (pos.x - x1).abs() <= half {
            return HitTarget::EndHandle(bar.stream_id);
        }
        let label_end = (x0 + half + metrics.label_width).min(x1 - half);
        if pos.x <= label_end {
            return HitTarget::Label(bar.stream_id);
        }
        return HitTarget::Body {
            stream_id: bar.stream_id,
            fraction,
        };
    }

    HitTarget::Empty {
        lane: layout::lane_at(pos.y, metrics.row_height, bars.len()),
        fraction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::drag::DragPhase;
    use crate::model::{Deadline, MIN_DURATION};
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn mapper() -> TimeMapper {
        TimeMapper::new(TimelineWindow::new(day(0), day(28)), 280.0).unwrap()
    }

    fn metrics() -> LaneMetrics {
        LaneMetrics {
            row_height: 30.0,
            bar_inset: 4.0,
            handle_width: 6.0,
            label_width: 40.0,
            marker_size: 8.0,
        }
    }

    fn project() -> Project {
        let mut p = Project::new("P", day(0), day(28));
        let mut a = Stream::new("A", day(2), day(20), 0);
        a.deadlines.push(Deadline::new(day(10)));
        a.deadlines.push(Deadline::new(day(40)));
        p.streams = vec![a, Stream::new("B", day(6), day(9), 1)];
        p
    }

    #[test]
    fn displayed_span_respects_floor_at_edges() {
        let w = mapper().window();
        let (s, e) = displayed_span(day(30), day(35), w);
        assert_eq!((s, e), (day(27), day(28)));
        assert!(e - s >= MIN_DURATION);
        let (s, e) = displayed_span(day(-9), day(-5), w);
        assert_eq!((s, e), (day(0), day(1)));
    }

    #[test]
    fn hidden_flags_are_counted_not_drawn() {
        let p = project();
        let bar = project_stream(&p.streams[0], 0, &mapper(), None);
        assert_eq!(bar.markers.len(), 1);
        assert_eq!(bar.hidden_markers, 1);
        assert_eq!(bar.start_fraction, 2.0 / 28.0);
        assert_eq!(bar.range_text, "Jan 03 – Jan 21");
    }

    #[test]
    fn preview_drives_projection() {
        let p = project();
        let preview = DragPreview {
            stream_id: p.streams[1].id,
            phase: DragPhase::Reordering,
            start: day(6),
            end: day(9),
            initial_lane: 1,
            target_lane: 0,
        };
        let bars = project_streams(&p, &mapper(), Some(&preview));
        assert_eq!((bars[0].lane, bars[1].lane), (1, 0));
        assert!(bars[1].dragging);
        assert!(!bars[0].dragging);
    }

    #[test]
    fn hit_test_regions() {
        let p = project();
        let m = metrics();
        let bars = project_streams(&p, &mapper(), None);
        let a = p.streams[0].id;
        // Bar A spans x 20..200 on row 0; its visible flag sits at x 100.
        assert_eq!(hit_test(&bars, &m, 280.0, Vec2::new(20.0, 15.0)), HitTarget::StartHandle(a));
        assert_eq!(hit_test(&bars, &m, 280.0, Vec2::new(199.0, 15.0)), HitTarget::EndHandle(a));
        assert_eq!(hit_test(&bars, &m, 280.0, Vec2::new(40.0, 15.0)), HitTarget::Label(a));
        assert!(matches!(
            hit_test(&bars, &m, 280.0, Vec2::new(100.0, 3.0)),
            HitTarget::Marker { stream_id, .. } if stream_id == a
        ));
        assert_eq!(
            hit_test(&bars, &m, 280.0, Vec2::new(140.0, 15.0)),
            HitTarget::Body { stream_id: a, fraction: 0.5 }
        );
        assert_eq!(
            hit_test(&bars, &m, 280.0, Vec2::new(250.0, 15.0)),
            HitTarget::Empty { lane: 0, fraction: 250.0 / 280.0 }
        );
        assert!(matches!(
            hit_test(&bars, &m, 280.0, Vec2::new(140.0, 75.0)),
            HitTarget::Empty { lane: 2, .. }
        ));
    }
}
