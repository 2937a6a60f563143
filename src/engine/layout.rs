//! Lane stacking.
//!
//! A stream's lane is its index in `Project::streams`. Reordering is a
//! remove-then-insert on that sequence; the live preview shown while
//! dragging is derived from the same rule so the commit never jumps.

/// Move the element at `from` so it ends up at `to`.
///
/// `to` is clamped to the last valid index. Returns `false` when `from` is
/// out of range, leaving `items` untouched.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }
    let to = to.min(items.len() - 1);
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

/// Lane at which the stream currently at `index` is drawn while the stream
/// at `initial` is being dragged to `target`.
pub fn displayed_lane(index: usize, initial: usize, target: usize) -> usize {
    if index == initial {
        target
    } else if initial < target && index > initial && index <= target {
        // Dragging down: the rows in between slide up into the vacated slot.
        index - 1
    } else if target < initial && index >= target && index < initial {
        index + 1
    } else {
        index
    }
}

/// Lane under a vertical drag that started on `initial_lane` and has moved `dy` pixels.
pub fn target_lane(initial_lane: usize, dy: f32, row_height: f32, lane_count: usize) -> usize {
    if lane_count == 0 || !(row_height > 0.0) || !dy.is_finite() {
        return initial_lane;
    }
    let top = lane_top(initial_lane, row_height) + dy;
    let lane = (top / row_height).round();
    lane.clamp(0.0, (lane_count - 1) as f32) as usize
}

pub fn lane_top(lane: usize, row_height: f32) -> f32 {
    lane as f32 * row_height
}

/// Lane for a pointer `y` offset inside the lane area, allowing one past the end.
pub fn lane_at(y: f32, row_height: f32, lane_count: usize) -> usize {
    if !(row_height > 0.0) || !(y > 0.0) {
        return 0;
    }
    ((y / row_height).floor() as usize).min(lane_count)
}
