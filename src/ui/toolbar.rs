use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::model::leveling::LevelingRequest;
use crate::model::timeline::TimelineScale;
use crate::state::{Command, LevelingCommand, ViewState};
use crate::ui::theme;

/// Render the top menu bar.
pub fn show_menu_bar(state: &ViewState, ui: &mut Ui) -> Vec<Command> {
    let mut commands = Vec::new();
    menu::bar(ui, |ui| {
        ui.menu_button("  File  ", |ui| {
            if ui.button(format!("{}  Export Utilization CSV...", icons::EXPORT)).clicked() {
                commands.push(Command::ExportUtilization);
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Open Settings Folder", icons::FOLDER_OPEN)).clicked() {
                commands.push(Command::OpenSettingsFolder);
                ui.close_menu();
            }
        });

        ui.menu_button("  View  ", |ui| {
            ui.label(RichText::new("Timeline Scale").small().weak());
            for &scale in TimelineScale::all() {
                if ui.radio(state.config.scale == scale, scale.label()).clicked() {
                    commands.push(Command::SetScale(scale));
                    ui.close_menu();
                }
            }
            ui.label(RichText::new("Ctrl+Scroll changes the scale").small().weak());
            ui.separator();
            let mut show_util = state.config.show_utilization;
            if ui.checkbox(&mut show_util, "Utilization rows").clicked() {
                commands.push(Command::ToggleUtilization);
            }
            let mut highlight = state.config.highlight_overallocations;
            if ui.checkbox(&mut highlight, "Highlight overallocations").clicked() {
                commands.push(Command::ToggleOverallocationHighlight);
            }
            ui.separator();
            if ui
                .add_enabled(state.filter.has_active_filters(), egui::Button::new("  Clear Filters"))
                .clicked()
            {
                commands.push(Command::ClearFilters);
                ui.close_menu();
            }
            if ui.button(format!("{}  Reload", icons::ARROWS_CLOCKWISE)).clicked() {
                commands.push(Command::Retry);
                ui.close_menu();
            }
        });

        ui.menu_button("  Leveling  ", |ui| {
            if ui.button("  Open Leveling Panel").clicked() {
                commands.push(Command::Leveling(LevelingCommand::Open));
                ui.close_menu();
            }
            ui.separator();
            for request in [
                LevelingRequest::Preview,
                LevelingRequest::RunSerial,
                LevelingRequest::RunParallel,
                LevelingRequest::Compare,
            ] {
                if ui.button(format!("  {}", request.label())).clicked() {
                    commands.push(Command::Leveling(LevelingCommand::Open));
                    commands.push(Command::Leveling(LevelingCommand::Request(request)));
                    ui.close_menu();
                }
            }
        });

        ui.menu_button("  Help  ", |ui| {
            if ui.button("About").clicked() {
                commands.push(Command::ShowAbout);
                ui.close_menu();
            }
        });
    });
    commands
}

/// Render the range and scale controls above the grid.
pub fn show_range_bar(state: &ViewState, ui: &mut Ui) -> Vec<Command> {
    let mut commands = Vec::new();
    let span = state.config.range().num_days();

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        if ui
            .button(icons::CARET_LEFT)
            .on_hover_text("Previous period")
            .clicked()
        {
            commands.push(Command::ShiftRange(-span));
        }
        if ui.button("Today").clicked() {
            let today = chrono::Local::now().date_naive();
            commands.push(Command::SetRange(today, today + chrono::Duration::days(span - 1)));
        }
        if ui
            .button(icons::CARET_RIGHT)
            .on_hover_text("Next period")
            .clicked()
        {
            commands.push(Command::ShiftRange(span));
        }

        ui.separator();

        let mut start = state.config.start_date();
        let mut end = state.config.end_date();
        ui.label(RichText::new("From").color(theme::TEXT_SECONDARY));
        let start_changed = ui
            .add(egui_extras::DatePickerButton::new(&mut start).id_salt("range_start"))
            .changed();
        ui.label(RichText::new("to").color(theme::TEXT_SECONDARY));
        let end_changed = ui
            .add(egui_extras::DatePickerButton::new(&mut end).id_salt("range_end"))
            .changed();
        if start_changed || end_changed {
            commands.push(Command::SetRange(start, end));
        }

        ui.separator();

        for &scale in TimelineScale::all() {
            if ui
                .selectable_label(state.config.scale == scale, scale.label())
                .clicked()
            {
                commands.push(Command::SetScale(scale));
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{span} days"))
                    .size(11.0)
                    .color(theme::TEXT_DIM),
            );
        });
    });
    commands
}
