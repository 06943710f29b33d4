use egui::{Context, RichText, Window};

use crate::ui::theme;

/// Render the "About" dialog. Returns `false` once the user closes it.
pub fn show_about_dialog(ctx: &Context, api_base_url: &str) -> bool {
    let mut keep_open = true;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([320.0, 190.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Resource Gantt").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("Resource timeline and utilization viewer");
                ui.label(RichText::new(api_base_url).small().color(theme::TEXT_DIM));
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    keep_open = false;
                }
            });
        });
    keep_open && !ctx.input(|i| i.key_pressed(egui::Key::Escape))
}
