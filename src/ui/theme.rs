use egui::style::WidgetVisuals;
use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::resource::ResourceType;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(22, 24, 31);
pub const BG_PANEL: Color32 = Color32::from_rgb(29, 31, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(35, 38, 50);
pub const BG_LANE_ALT: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 5);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(70, 130, 210, 40);
pub const BG_WEEKEND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const BG_OVERALLOCATED: Color32 = Color32::from_rgba_premultiplied(70, 18, 18, 70);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 53, 66);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(228, 231, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(150, 156, 176);
pub const TEXT_DIM: Color32 = Color32::from_rgb(98, 104, 122);
pub const TEXT_ON_BAR: Color32 = Color32::WHITE;

pub const ACCENT: Color32 = Color32::from_rgb(74, 136, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(42, 45, 58);

pub const CRITICAL: Color32 = Color32::from_rgb(226, 74, 74);
pub const OVERALLOCATED: Color32 = Color32::from_rgb(232, 84, 64);
pub const WARNING: Color32 = Color32::from_rgb(240, 176, 48);
pub const HEALTHY: Color32 = Color32::from_rgb(72, 176, 104);
pub const ERROR_TEXT: Color32 = Color32::from_rgb(255, 120, 110);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const SUB_ROW_HEIGHT: f32 = 22.0;
pub const UTIL_ROW_HEIGHT: f32 = 16.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const BAR_INSET: f32 = 3.0;

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

// ── Domain colors ────────────────────────────────────────────────────────────

/// Bar color of a resource category.
pub fn type_color(resource_type: ResourceType) -> Color32 {
    match resource_type {
        ResourceType::Labor => Color32::from_rgb(66, 133, 244),
        ResourceType::Equipment => Color32::from_rgb(0, 172, 193),
        ResourceType::Material => Color32::from_rgb(171, 71, 188),
    }
}

/// Cell color of a utilization percentage: green up to 80 %, amber up to 100 %, red above.
pub fn utilization_color(percent: f64) -> Color32 {
    if percent > 100.0 {
        OVERALLOCATED
    } else if percent > 80.0 {
        WARNING
    } else if percent > 0.0 {
        HEALTHY
    } else {
        GRID_LINE
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

fn widget(bg: Color32, border: Color32, fg: Stroke) -> WidgetVisuals {
    WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: Stroke::new(1.0, border),
        fg_stroke: fg,
        rounding: Rounding::same(4.0),
        expansion: 0.0,
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_DARK;
    visuals.faint_bg_color = BG_LANE_ALT;

    visuals.widgets.noninteractive = widget(BG_PANEL, BORDER_SUBTLE, Stroke::new(1.0, TEXT_SECONDARY));
    visuals.widgets.inactive = widget(
        Color32::from_rgb(41, 44, 57),
        BORDER_SUBTLE,
        Stroke::new(1.0, TEXT_PRIMARY),
    );
    visuals.widgets.hovered = widget(Color32::from_rgb(51, 55, 70), ACCENT, Stroke::new(1.0, TEXT_PRIMARY));
    visuals.widgets.active = widget(Color32::from_rgb(59, 63, 78), ACCENT, Stroke::new(2.0, Color32::WHITE));
    visuals.widgets.open = widget(Color32::from_rgb(49, 53, 68), ACCENT, Stroke::new(1.0, TEXT_PRIMARY));

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
