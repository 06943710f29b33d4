use egui::{Align2, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::api::ResourceHistogram;
use crate::model::lane::ResourceLane;
use crate::model::resource::format_optional_date;
use crate::model::utilization::{UtilizationPoint, UtilizationSummary};
use crate::ui::theme;

/// Highest percentage the chart scales to; taller bars are capped.
const MAX_PERCENT: f64 = 150.0;

/// What the panel has to show for the selected resource.
pub enum HistogramSource<'a> {
    Service(&'a ResourceHistogram),
    /// Computed from the loaded assignments while the service figure is unavailable.
    Local(&'a UtilizationSummary),
}

pub struct HistogramPanel<'a> {
    pub lane: &'a ResourceLane,
    pub source: HistogramSource<'a>,
    pub fetching: bool,
    pub error: Option<&'a str>,
}

pub fn show_histogram(panel: &HistogramPanel<'_>, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(format!("{}  {}", panel.lane.resource_code, panel.lane.resource_name))
                .strong(),
        );
        if panel.fetching {
            ui.spinner();
        }
    });
    if let Some(err) = panel.error {
        ui.label(egui::RichText::new(err).small().color(theme::ERROR_TEXT));
    }

    let (points, peak, peak_date, average, over_days, available, assigned, local) = match &panel.source {
        HistogramSource::Service(h) => (
            h.data_points.as_slice(),
            h.peak_utilization,
            h.peak_date,
            h.average_utilization,
            h.overallocated_days as usize,
            h.total_available_hours,
            h.total_assigned_hours,
            false,
        ),
        HistogramSource::Local(s) => (
            s.points.as_slice(),
            s.peak_utilization,
            s.peak_date,
            s.average_utilization,
            s.overallocated_days,
            s.total_available_hours,
            s.total_assigned_hours,
            true,
        ),
    };

    draw_bars(ui, points);

    egui::Grid::new("histogram_summary")
        .num_columns(2)
        .spacing([12.0, 2.0])
        .show(ui, |ui| {
            ui.label("Peak");
            ui.label(format!("{peak:.0}% on {}", format_optional_date(peak_date)));
            ui.end_row();
            ui.label("Average");
            ui.label(format!("{average:.0}%"));
            ui.end_row();
            ui.label("Overallocated");
            ui.label(over_days.to_string());
            ui.end_row();
            ui.label("Hours");
            ui.label(format!("{assigned:.1} / {available:.1}"));
            ui.end_row();
        });
    if local {
        ui.label(
            egui::RichText::new("Computed from loaded assignments")
                .small()
                .color(theme::TEXT_DIM),
        );
    }
}

fn draw_bars(ui: &mut Ui, points: &[UtilizationPoint]) {
    let width = ui.available_width();
    let height = 90.0;
    let (rect, response) = ui.allocate_exact_size(Vec2::new(width, height), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, Rounding::same(4.0), theme::BG_DARK);

    if points.is_empty() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "No data",
            theme::font_small(),
            theme::TEXT_DIM,
        );
        return;
    }

    let scale = |percent: f64| (percent.min(MAX_PERCENT) / MAX_PERCENT) as f32 * (height - 8.0);
    let slot = width / points.len() as f32;
    for (i, p) in points.iter().enumerate() {
        let h = scale(p.utilization_percent);
        let bar = Rect::from_min_max(
            Pos2::new(rect.left() + i as f32 * slot + 1.0, rect.bottom() - 4.0 - h),
            Pos2::new(rect.left() + (i + 1) as f32 * slot - 1.0, rect.bottom() - 4.0),
        );
        painter.rect_filled(bar, 1.0, theme::utilization_color(p.utilization_percent));
    }

    let full = rect.bottom() - 4.0 - scale(100.0);
    painter.line_segment(
        [Pos2::new(rect.left(), full), Pos2::new(rect.right(), full)],
        Stroke::new(1.0, theme::TEXT_DIM),
    );

    if let Some(pos) = response.hover_pos() {
        let idx = ((pos.x - rect.left()) / slot) as usize;
        if let Some(p) = points.get(idx) {
            response.on_hover_text_at_pointer(format!(
                "{}\n{:.1} h / {:.1} h ({:.0}%)",
                p.date.format("%d/%m/%Y"),
                p.assigned_hours,
                p.available_hours,
                p.utilization_percent
            ));
        }
    }
}
