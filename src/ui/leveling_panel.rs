//! Leveling window: request previews and runs, compare the serial and
//! parallel strategies side by side, pick shifts and apply them.

use egui::{Context, RichText, Ui, Window};

use crate::model::leveling::{
    metric_rows, LevelingRequest, LevelingResult, LevelingState, RequestStatus, Strategy,
};
use crate::state::{Command, LevelingCommand};
use crate::ui::theme;

pub fn show_leveling_window(state: &LevelingState, ctx: &Context) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut open = state.open;

    Window::new(RichText::new("Resource Leveling").strong().size(14.0))
        .open(&mut open)
        .default_size([620.0, 520.0])
        .collapsible(false)
        .show(ctx, |ui| {
            show_options(state, ui, &mut commands);
            ui.separator();
            show_strategies(state, ui);
            ui.separator();
            show_comparison(state, ui);
            ui.separator();
            show_shifts(state, ui, &mut commands);
        });

    if !open {
        commands.push(Command::Leveling(LevelingCommand::Close));
    }
    commands
}

fn show_options(state: &LevelingState, ui: &mut Ui, commands: &mut Vec<Command>) {
    let mut options = state.options.clone();
    ui.horizontal_wrapped(|ui| {
        ui.checkbox(&mut options.preserve_critical_path, "Preserve critical path");
        ui.checkbox(&mut options.level_within_float, "Level within float");
        ui.label("Max iterations");
        ui.add(egui::DragValue::new(&mut options.max_iterations).range(1..=10_000));
    });
    if options != state.options {
        commands.push(Command::Leveling(LevelingCommand::SetOptions(options)));
    }

    ui.horizontal(|ui| {
        for request in [
            LevelingRequest::Preview,
            LevelingRequest::RunSerial,
            LevelingRequest::RunParallel,
            LevelingRequest::Compare,
        ] {
            if ui.button(request.label()).clicked() {
                commands.push(Command::Leveling(LevelingCommand::Request(request)));
            }
        }
    });
}

fn show_strategies(state: &LevelingState, ui: &mut Ui) {
    ui.columns(2, |cols| {
        for (ui, strategy) in cols.iter_mut().zip([Strategy::Serial, Strategy::Parallel]) {
            ui.label(RichText::new(strategy.label()).strong());
            match state.result(strategy) {
                RequestStatus::Idle => {
                    ui.label(RichText::new("Not run yet").color(theme::TEXT_DIM));
                }
                RequestStatus::Loading => {
                    ui.spinner();
                }
                RequestStatus::Failed(message) => {
                    ui.label(RichText::new(message).color(theme::ERROR_TEXT));
                }
                RequestStatus::Loaded(result) => show_result_summary(result, ui),
            }
        }
    });
}

fn show_result_summary(result: &LevelingResult, ui: &mut Ui) {
    let status = if result.success {
        RichText::new("Succeeded").color(theme::HEALTHY)
    } else {
        RichText::new("Incomplete").color(theme::WARNING)
    };
    ui.label(status);
    ui.label(format!("{} shifts in {} iterations", result.shifts.len(), result.iterations_used));
    ui.label(format!("Remaining overallocations: {}", result.remaining_overallocations));
    ui.label(format!("Project extension: {} d", result.project_extension_days));
    if let Some(finish) = result.new_project_finish {
        ui.label(format!("New finish: {}", finish.format("%d/%m/%Y")));
    }
    if let Some(threads) = result.threads_used {
        ui.label(format!("Threads: {threads}"));
    }
    for warning in &result.warnings {
        ui.label(RichText::new(warning).small().color(theme::WARNING));
    }
}

fn show_comparison(state: &LevelingState, ui: &mut Ui) {
    let (rows, recommendation) = match &state.comparison {
        RequestStatus::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Comparing strategies...");
            });
            return;
        }
        RequestStatus::Failed(message) => {
            ui.label(RichText::new(message).color(theme::ERROR_TEXT));
            return;
        }
        RequestStatus::Loaded(c) => (metric_rows(&c.serial, &c.parallel), Some(c.recommendation.as_str())),
        RequestStatus::Idle => match (state.serial.loaded(), state.parallel.loaded()) {
            (Some(s), Some(p)) => (metric_rows(&s.metrics(), &p.metrics()), None),
            _ => {
                ui.label(RichText::new("Run both strategies or Compare to see metrics").color(theme::TEXT_DIM));
                return;
            }
        },
    };

    egui::Grid::new("leveling_metrics")
        .num_columns(3)
        .striped(true)
        .spacing([24.0, 4.0])
        .show(ui, |ui| {
            ui.label("");
            ui.strong(Strategy::Serial.label());
            ui.strong(Strategy::Parallel.label());
            ui.end_row();
            for row in rows {
                ui.label(row.label);
                ui.label(row.serial);
                ui.label(row.parallel);
                ui.end_row();
            }
        });
    if let Some(text) = recommendation {
        ui.add_space(4.0);
        ui.label(RichText::new(format!("Recommendation: {text}")).color(theme::ACCENT));
    }
}

fn show_shifts(state: &LevelingState, ui: &mut Ui, commands: &mut Vec<Command>) {
    let Some(result) = state.shift_result() else {
        return;
    };
    let source = state.shift_source.map_or("", Strategy::label);
    ui.label(RichText::new(format!("Shifts ({source})")).strong());

    egui::ScrollArea::vertical()
        .id_salt("leveling_shifts")
        .max_height(180.0)
        .show(ui, |ui| {
            egui::Grid::new("leveling_shift_grid")
                .num_columns(5)
                .spacing([12.0, 2.0])
                .show(ui, |ui| {
                    for shift in &result.shifts {
                        let mut ticked = state.selected_shifts.contains(&shift.activity_id);
                        if ui.checkbox(&mut ticked, "").changed() {
                            commands.push(Command::Leveling(LevelingCommand::ToggleShift(shift.activity_id)));
                        }
                        ui.label(format!("{} {}", shift.activity_code, shift.activity_name));
                        ui.label(format!(
                            "{} → {}",
                            shift.original_start.format("%d/%m"),
                            shift.new_start.format("%d/%m")
                        ));
                        ui.label(format!("+{} d", shift.delay_days));
                        ui.label(RichText::new(&shift.reason).small().color(theme::TEXT_SECONDARY));
                        ui.end_row();
                    }
                });
        });

    ui.horizontal(|ui| {
        let can_apply = !state.selected_shifts.is_empty() && !state.apply.is_loading();
        let label = format!("Apply {} shifts", state.selected_shifts.len());
        if ui.add_enabled(can_apply, egui::Button::new(label)).clicked() {
            commands.push(Command::Leveling(LevelingCommand::Request(LevelingRequest::Apply)));
        }
        match &state.apply {
            RequestStatus::Loading => {
                ui.spinner();
            }
            RequestStatus::Loaded(count) => {
                ui.label(RichText::new(format!("Applied {count} shifts")).color(theme::HEALTHY));
            }
            RequestStatus::Failed(message) => {
                ui.label(RichText::new(message).color(theme::ERROR_TEXT));
            }
            RequestStatus::Idle => {}
        }
    });
}
