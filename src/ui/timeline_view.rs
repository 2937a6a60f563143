use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use egui::{Color32, CursorIcon, PointerButton, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::engine::projection::{hit_test, project_streams};
use crate::engine::{context, Commit, ContextAction, DragPhase, HitTarget, InteractionController, StreamBar};
use crate::model::{Project, TimeMapper, TimelineWindow};
use crate::ui::theme;

/// What the user did in the timeline this frame.
#[derive(Debug, Clone, Default)]
pub struct TimelineInteraction {
    pub commit: Option<Commit>,
    /// Right-click result and the screen position it happened at.
    pub context: Option<(ContextAction, Pos2)>,
    pub edit_deadline: Option<Uuid>,
    pub edit_stream: Option<Uuid>,
}

/// Render the timeline and feed raw pointer input to the drag controller.
pub fn show_timeline(
    project: &Project,
    controller: &mut InteractionController,
    window: TimelineWindow,
    ui: &mut Ui,
) -> TimelineInteraction {
    let mut interaction = TimelineInteraction::default();
    let metrics = theme::metrics();
    let available = ui.available_size();
    let lanes_height = (project.streams.len() + 1) as f32 * metrics.row_height;
    let height = (theme::HEADER_HEIGHT + lanes_height).max(available.y);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) =
                ui.allocate_painter(Vec2::new(available.x, height), Sense::click_and_drag());
            let rect = response.rect;
            let lane_rect = Rect::from_min_max(
                Pos2::new(rect.left(), rect.top() + theme::HEADER_HEIGHT),
                rect.max,
            );

            painter.rect_filled(rect, 0.0, theme::BG_DARK);

            let Some(mapper) = TimeMapper::new(window, lane_rect.width()) else {
                // No usable geometry: drop any live session rather than guess.
                interaction.commit = controller.pointer_cancel();
                return;
            };

            // ── Pointer input ────────────────────────────────────────────────
            let (pressed, released, down, secondary, pointer, focused) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_released(),
                    i.pointer.primary_down(),
                    i.pointer.button_clicked(PointerButton::Secondary),
                    i.pointer.interact_pos(),
                    i.focused,
                )
            });
            let over_lanes = pointer.filter(|p| lane_rect.contains(*p) && response.contains_pointer());

            if controller.is_active() {
                if released {
                    interaction.commit = controller.pointer_up();
                } else if !down || !focused {
                    // Release happened somewhere we never saw it.
                    interaction.commit = controller.pointer_cancel();
                } else {
                    controller.rescale(mapper);
                    if let Some(p) = pointer {
                        controller.pointer_move(p);
                    }
                }
            } else if let Some(p) = over_lanes {
                let bars = project_streams(project, &mapper, None);
                let target = hit_test(&bars, &metrics, mapper.width_px(), p - lane_rect.min);
                if pressed {
                    match target {
                        HitTarget::Label(id) => interaction.edit_stream = Some(id),
                        HitTarget::Marker { deadline_id, .. } => {
                            interaction.edit_deadline = Some(deadline_id)
                        }
                        other => {
                            if let Some(grab) = other.grab() {
                                controller.begin(grab, project, Some(mapper), p, metrics.row_height);
                            }
                        }
                    }
                } else if secondary {
                    interaction.context = Some((context::context_action(target, &mapper), p));
                } else {
                    hover_feedback(ui, &bars, target);
                }
            }

            // ── Paint ────────────────────────────────────────────────────────
            let preview = controller.preview();
            let bars = project_streams(project, &mapper, preview.as_ref());

            draw_lanes(&painter, lane_rect, project.streams.len());
            if let Some(p) = preview.filter(|p| p.phase == DragPhase::Reordering) {
                let slot = Rect::from_min_size(
                    Pos2::new(lane_rect.left(), lane_rect.top() + p.target_lane as f32 * metrics.row_height),
                    Vec2::new(lane_rect.width(), metrics.row_height),
                );
                painter.rect_filled(slot, 0.0, theme::BG_DROP_SLOT);
            }
            draw_header(&painter, rect, lane_rect, &mapper);
            draw_today_line(&painter, rect, lane_rect, &mapper);

            // Dragged bar last so it paints over its neighbours.
            for bar in bars.iter().filter(|b| !b.dragging) {
                draw_stream_bar(&painter, lane_rect, bar);
            }
            for bar in bars.iter().filter(|b| b.dragging) {
                draw_stream_bar(&painter, lane_rect, bar);
            }

            if project.streams.is_empty() {
                painter.text(
                    Pos2::new(lane_rect.center().x, lane_rect.top() + metrics.row_height),
                    egui::Align2::CENTER_CENTER,
                    "Right-click to add a stream",
                    theme::font_bar(),
                    theme::TEXT_DIM,
                );
            }

            let icon = match controller.phase() {
                DragPhase::Idle => None,
                DragPhase::Reordering => Some(CursorIcon::ResizeVertical),
                DragPhase::ResizingStart | DragPhase::ResizingEnd => Some(CursorIcon::ResizeHorizontal),
                DragPhase::Armed | DragPhase::Moving => Some(CursorIcon::Grabbing),
            };
            if let Some(icon) = icon {
                ui.ctx().set_cursor_icon(icon);
            }
        });

    if interaction.commit.is_some() || controller.is_active() {
        ui.ctx().request_repaint();
    }
    interaction
}

fn hover_feedback(ui: &Ui, bars: &[StreamBar], target: HitTarget) {
    let bar_for = |id: Uuid| bars.iter().find(|b| b.stream_id == id);
    match target {
        HitTarget::StartHandle(_) | HitTarget::EndHandle(_) => {
            ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal);
        }
        HitTarget::Body { stream_id, .. } | HitTarget::Label(stream_id) => {
            ui.ctx().set_cursor_icon(if matches!(target, HitTarget::Label(_)) {
                CursorIcon::PointingHand
            } else {
                CursorIcon::Grab
            });
            if let Some(bar) = bar_for(stream_id) {
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    egui::Id::new(("stream-tip", stream_id)),
                    |ui| {
                        ui.strong(&bar.label);
                        ui.label(&bar.range_text);
                        if bar.hidden_markers > 0 {
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} deadline(s) outside the view",
                                    bar.hidden_markers
                                ))
                                .color(theme::TEXT_DIM),
                            );
                        }
                    },
                );
            }
        }
        HitTarget::Marker {
            stream_id,
            deadline_id,
        } => {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
            let comment = bar_for(stream_id)
                .and_then(|b| b.markers.iter().find(|m| m.deadline_id == deadline_id))
                .map(|m| m.comment.clone())
                .unwrap_or_default();
            egui::show_tooltip_at_pointer(
                ui.ctx(),
                ui.layer_id(),
                egui::Id::new(("flag-tip", deadline_id)),
                |ui| {
                    if comment.is_empty() {
                        ui.label(egui::RichText::new("No comment").italics().weak());
                    } else {
                        ui.label(comment);
                    }
                },
            );
        }
        HitTarget::Empty { .. } => {}
    }
}

/// Monday midnights inside the window, used for the week grid.
pub fn week_ticks(window: TimelineWindow) -> Vec<DateTime<Utc>> {
    let first_day = window.start.date_naive();
    let back = first_day.weekday().num_days_from_monday() as i64;
    let mut tick = (first_day - Duration::days(back)).and_time(NaiveTime::MIN).and_utc();
    let mut ticks = Vec::new();
    while tick < window.end {
        if tick >= window.start {
            ticks.push(tick);
        }
        tick += Duration::weeks(1);
    }
    ticks
}

fn draw_lanes(painter: &egui::Painter, lane_rect: Rect, count: usize) {
    let row_h = theme::ROW_HEIGHT;
    for i in 0..count {
        let y = lane_rect.top() + i as f32 * row_h;
        let bg = if i % 2 == 0 { theme::BG_PANEL } else { theme::BG_ROW_ALT };
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(lane_rect.left(), y), Vec2::new(lane_rect.width(), row_h)),
            0.0,
            bg,
        );
        painter.line_segment(
            [
                Pos2::new(lane_rect.left(), y + row_h),
                Pos2::new(lane_rect.right(), y + row_h),
            ],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
}

fn draw_header(painter: &egui::Painter, rect: Rect, lane_rect: Rect, mapper: &TimeMapper) {
    let header = Rect::from_min_max(rect.min, Pos2::new(rect.right(), lane_rect.top()));
    painter.rect_filled(header, 0.0, theme::BG_HEADER);
    painter.line_segment(
        [header.left_bottom(), header.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let mut last_month = None;
    for tick in week_ticks(mapper.window()) {
        let x = lane_rect.left() + mapper.time_to_x(tick);
        painter.line_segment(
            [Pos2::new(x, lane_rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        painter.text(
            Pos2::new(x + 3.0, rect.top() + 30.0),
            egui::Align2::LEFT_CENTER,
            tick.format("%d").to_string(),
            theme::font_sub(),
            theme::TEXT_SECONDARY,
        );
        if last_month != Some(tick.month()) {
            painter.text(
                Pos2::new(x + 3.0, rect.top() + 13.0),
                egui::Align2::LEFT_CENTER,
                tick.format("%b %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
            last_month = Some(tick.month());
        }
    }
}

fn draw_today_line(painter: &egui::Painter, rect: Rect, lane_rect: Rect, mapper: &TimeMapper) {
    let now = Utc::now();
    if !mapper.window().contains(now) {
        return;
    }
    let x = lane_rect.left() + mapper.time_to_x(now);
    painter.line_segment(
        [Pos2::new(x, lane_rect.top()), Pos2::new(x, rect.bottom())],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, lane_rect.top() - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

fn draw_stream_bar(painter: &egui::Painter, lane_rect: Rect, bar: &StreamBar) {
    let width = lane_rect.width();
    let row_top = lane_rect.top() + bar.lane as f32 * theme::ROW_HEIGHT;
    let x0 = lane_rect.left() + bar.start_fraction as f32 * width;
    let x1 = lane_rect.left() + bar.end_fraction as f32 * width;
    let inset = theme::BAR_INSET;

    let bar_rect = Rect::from_min_max(
        Pos2::new(x0, row_top + inset),
        Pos2::new(x1.max(x0 + 2.0), row_top + theme::ROW_HEIGHT - inset),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let color = theme::stream_color(bar.color);

    painter.rect_filled(bar_rect.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));
    painter.rect_filled(bar_rect, rounding, color);
    painter.rect_filled(
        Rect::from_min_size(bar_rect.min, Vec2::new(bar_rect.width(), (bar_rect.height() * 0.45).max(4.0))),
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if bar.dragging {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Resize handles
    let handle_h = bar_rect.height() * 0.55;
    let handle_y = bar_rect.center().y - handle_h / 2.0;
    for hx in [bar_rect.left() + 2.0, bar_rect.right() - 6.0] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(hx, handle_y), Vec2::new(4.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR.gamma_multiply(0.6),
        );
    }

    if bar_rect.width() > 30.0 {
        let text = if bar.dragging {
            format!("{}  {}", bar.label, bar.range_text)
        } else {
            bar.label.clone()
        };
        let galley = painter.layout_no_wrap(text, theme::font_bar(), theme::TEXT_ON_BAR);
        let clipped = painter.with_clip_rect(bar_rect.shrink2(Vec2::new(8.0, 0.0)));
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(Pos2::new(bar_rect.left() + 9.0, text_y), galley, Color32::TRANSPARENT);
    }

    for marker in &bar.markers {
        let x = lane_rect.left() + marker.fraction as f32 * width;
        draw_flag(painter, Pos2::new(x, row_top + 1.0));
    }
}

fn draw_flag(painter: &egui::Painter, top: Pos2) {
    let size = theme::MARKER_SIZE;
    painter.line_segment(
        [top, Pos2::new(top.x, top.y + theme::ROW_HEIGHT - 2.0)],
        Stroke::new(1.5, theme::FLAG_COLOR),
    );
    painter.add(egui::Shape::convex_polygon(
        vec![
            top,
            Pos2::new(top.x + size * 0.7, top.y + size * 0.3),
            Pos2::new(top.x, top.y + size * 0.6),
        ],
        theme::FLAG_COLOR,
        Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    #[test]
    fn week_ticks_fall_on_mondays_inside_the_window() {
        // 2024-01-03 is a Wednesday.
        let start = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let window = TimelineWindow::new(start, start + Duration::weeks(4));
        let ticks = week_ticks(window);
        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0], Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());
        assert!(ticks.iter().all(|t| t.weekday() == Weekday::Mon));
        assert!(ticks.iter().all(|t| window.contains(*t)));
    }

    #[test]
    fn week_ticks_include_a_monday_start() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ticks = week_ticks(TimelineWindow::new(start, start + Duration::days(8)));
        assert_eq!(ticks, vec![start, start + Duration::weeks(1)]);
    }
}
