use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::TaskPriority;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_FIELD: Color32 = Color32::from_rgb(20, 20, 28);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);
pub const BG_CURRENT_UNIT: Color32 = Color32::from_rgba_premultiplied(231, 76, 60, 40);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const DANGER: Color32 = Color32::from_rgb(229, 57, 53);
pub const NOW_LINE: Color32 = Color32::from_rgb(231, 76, 60);
pub const AXIS_LINE: Color32 = Color32::from_rgb(127, 140, 141);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const TICK_MINOR: Color32 = Color32::from_rgb(80, 84, 98);
pub const HANDLE_COLOR: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 128);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const SCALE_HEIGHT: f32 = 30.0;
/// Height of the axis strip drawn above the first task row.
pub const AXIS_HEIGHT: f32 = 40.0;
pub const HANDLE_WIDTH: f32 = 7.0;
pub const BAR_ROUNDING: f32 = 6.0;
pub const LIST_INDENT: f32 = 20.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_bar() -> FontId {
    FontId::proportional(12.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(10.5)
}

// ── Task colors ──────────────────────────────────────────────────────────────

/// Swatches offered in the task form.
pub const TASK_COLORS: &[&str] = &[
    "#3498db", "#2ecc71", "#9b59b6", "#e67e22", "#e74c3c", "#1abc9c", "#f1c40f", "#34495e",
];

pub fn priority_color(priority: TaskPriority) -> Color32 {
    match priority {
        TaskPriority::Low => Color32::from_rgb(149, 165, 166),
        TaskPriority::Medium => Color32::from_rgb(52, 152, 219),
        TaskPriority::High => Color32::from_rgb(243, 156, 18),
        TaskPriority::Urgent => Color32::from_rgb(231, 76, 60),
    }
}

/// Parse `#rrggbb` (or `rrggbb`). Anything else yields `None`.
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// The task's display color, falling back to the accent for bad hints.
pub fn task_color(hint: &str) -> Color32 {
    parse_hex_color(hint).unwrap_or(ACCENT)
}

pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_FIELD;

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    visuals.widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#3498db"), Some(Color32::from_rgb(0x34, 0x98, 0xdb)));
        assert_eq!(parse_hex_color("2ecc71"), Some(Color32::from_rgb(0x2e, 0xcc, 0x71)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("blue"), None);
        assert_eq!(task_color("nonsense"), ACCENT);
    }

    #[test]
    fn hex_round_trip() {
        assert_eq!(to_hex([0x9b, 0x59, 0xb6]), "#9b59b6");
    }
}
