#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use resource_gantt::app::ResourceGanttApp;
use resource_gantt::config::AppSettings;
use resource_gantt::logging;

fn main() -> eframe::Result<()> {
    // Settings come first so the log filter can be configured; failures are
    // reported once logging is up.
    let (settings, load_error) = match AppSettings::load() {
        Ok(settings) => (settings, None),
        Err(err) => {
            let mut fallback = AppSettings::default();
            fallback.apply_overrides(|name| std::env::var(name).ok());
            (fallback, Some(err))
        }
    };
    logging::init(&settings.log_filter);
    if let Some(err) = load_error {
        tracing::error!(error = %err, "could not load settings; using defaults");
    }
    tracing::info!(api = %settings.api_base_url, program = ?settings.program_id, "starting");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 820.0])
            .with_min_inner_size([900.0, 480.0])
            .with_title("Resource Gantt"),
        ..Default::default()
    };

    eframe::run_native(
        "Resource Gantt",
        options,
        Box::new(|cc| Ok(Box::new(ResourceGanttApp::new(cc, settings)?))),
    )
}
