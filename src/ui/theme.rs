use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::engine::LaneMetrics;
use crate::model::PALETTE_SIZE;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_ALT: Color32 = Color32::from_rgb(28, 28, 37);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);
pub const BG_DROP_SLOT: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 28);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);
pub const FLAG_COLOR: Color32 = Color32::from_rgb(255, 193, 7);
pub const DONE_COLOR: Color32 = Color32::from_rgb(52, 168, 83);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const ROW_HEIGHT: f32 = 34.0;
pub const HEADER_HEIGHT: f32 = 44.0;
pub const HANDLE_WIDTH: f32 = 8.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 5.0;
pub const LABEL_WIDTH: f32 = 90.0;
pub const MARKER_SIZE: f32 = 12.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;

/// Lane geometry shared by painting and hit-testing.
pub fn metrics() -> LaneMetrics {
    LaneMetrics {
        row_height: ROW_HEIGHT,
        bar_inset: BAR_INSET,
        handle_width: HANDLE_WIDTH,
        label_width: LABEL_WIDTH,
        marker_size: MARKER_SIZE,
    }
}

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

// ── Stream palette ───────────────────────────────────────────────────────────

pub const STREAM_PALETTE: [Color32; PALETTE_SIZE] = [
    Color32::from_rgb(66, 133, 244), // blue
    Color32::from_rgb(52, 168, 83),  // green
    Color32::from_rgb(171, 71, 188), // purple
    Color32::from_rgb(251, 140, 0),  // orange
];

pub const STREAM_PALETTE_NAMES: [&str; PALETTE_SIZE] = ["Blue", "Green", "Purple", "Orange"];

pub fn stream_color(index: usize) -> Color32 {
    STREAM_PALETTE[index % PALETTE_SIZE]
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);
    visuals.faint_bg_color = BG_ROW_ALT;
    visuals.striped = false;

    let widgets = &mut visuals.widgets;
    style_widget(&mut widgets.noninteractive, BG_PANEL, BORDER_SUBTLE, Stroke::new(1.0, TEXT_SECONDARY));
    style_widget(&mut widgets.inactive, Color32::from_rgb(42, 44, 56), BORDER_SUBTLE, Stroke::new(1.0, TEXT_PRIMARY));
    style_widget(&mut widgets.hovered, Color32::from_rgb(52, 54, 68), ACCENT, Stroke::new(1.0, TEXT_PRIMARY));
    style_widget(&mut widgets.active, Color32::from_rgb(60, 62, 76), ACCENT, Stroke::new(2.0, Color32::WHITE));
    style_widget(&mut widgets.open, Color32::from_rgb(50, 52, 66), ACCENT, Stroke::new(1.0, TEXT_PRIMARY));

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    ctx.set_visuals(visuals);

    ctx.style_mut(|style| {
        style.spacing.item_spacing = egui::vec2(8.0, 4.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
    });
}

fn style_widget(w: &mut egui::style::WidgetVisuals, fill: Color32, border: Color32, fg: Stroke) {
    w.bg_fill = fill;
    w.weak_bg_fill = fill;
    w.bg_stroke = Stroke::new(1.0, border);
    w.fg_stroke = fg;
    w.rounding = Rounding::same(4.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_color_wraps_the_palette() {
        assert_eq!(stream_color(0), STREAM_PALETTE[0]);
        assert_eq!(stream_color(PALETTE_SIZE + 1), STREAM_PALETTE[1]);
    }

    #[test]
    fn bars_fit_inside_rows() {
        let m = metrics();
        assert!(m.bar_inset * 2.0 < m.row_height);
        assert!(m.marker_size <= m.row_height);
    }
}
