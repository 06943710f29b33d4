use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::model::lane::ResourceLane;
use crate::state::Command;
use crate::ui::theme;

/// Render the list of visible resources in the sidebar.
pub fn show_resource_table(
    lanes: &[ResourceLane],
    selected_resource: Option<Uuid>,
    ui: &mut Ui,
) -> Option<Command> {
    let mut command = None;

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Resources")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.label(
            RichText::new(format!("({})", lanes.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(2.0);

    ui.horizontal(|ui| {
        ui.add_space(24.0);
        let hdr = |ui: &mut Ui, text: &str, width: f32| {
            ui.allocate_ui(egui::vec2(width, 16.0), |ui| {
                ui.label(RichText::new(text).size(9.0).color(theme::TEXT_DIM).strong());
            });
        };
        hdr(ui, "RESOURCE", 150.0);
        hdr(ui, "H/DAY", 40.0);
        hdr(ui, "PEAK", 40.0);
    });

    egui::ScrollArea::vertical()
        .id_salt("resource_table")
        .max_height(ui.available_height() * 0.5)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for (i, lane) in lanes.iter().enumerate() {
                let is_selected = selected_resource == Some(lane.resource_id);
                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if i % 2 == 0 {
                    theme::BG_PANEL
                } else {
                    theme::BG_DARK
                };

                let frame = egui::Frame::none()
                    .fill(row_bg)
                    .rounding(egui::Rounding::same(4.0))
                    .inner_margin(egui::Margin::symmetric(6.0, 3.0));

                let frame_resp = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;
                        ui.label(
                            RichText::new(lane.resource_type.icon())
                                .color(theme::type_color(lane.resource_type)),
                        );
                        let name = RichText::new(format!("{}  {}", lane.resource_code, lane.resource_name))
                            .size(12.0)
                            .color(if is_selected {
                                Color32::WHITE
                            } else {
                                theme::TEXT_PRIMARY
                            });
                        ui.add_sized([150.0, 18.0], egui::Label::new(name).truncate());
                        ui.label(
                            RichText::new(format!("{:.0}", lane.capacity_per_day))
                                .size(10.0)
                                .color(theme::TEXT_SECONDARY),
                        );
                        let peak = lane.peak_utilization();
                        ui.label(
                            RichText::new(format!("{peak:.0}%"))
                                .size(10.0)
                                .color(theme::utilization_color(peak)),
                        );
                    });
                });

                let row_click = ui.interact(
                    frame_resp.response.rect,
                    egui::Id::new(("resource-row", lane.resource_id)),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    let next = if is_selected { None } else { Some(lane.resource_id) };
                    command = Some(Command::SelectResource(next));
                }
                ui.add_space(1.0);
            }
        });

    command
}
