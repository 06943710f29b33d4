use std::collections::BTreeSet;

use egui::{RichText, Ui};
use egui_phosphor::regular as icons;
use uuid::Uuid;

use crate::model::filter::{FilterState, FilterStats};
use crate::model::resource::ResourceType;
use crate::state::Command;
use crate::ui::theme;

/// Render search, type chips, toggles and pool chips.
///
/// `stats` describes the unfiltered lanes so counts do not shrink as
/// filters are applied.
pub fn show_filter_bar(
    filter: &FilterState,
    stats: &FilterStats,
    pools: &BTreeSet<Uuid>,
    ui: &mut Ui,
) -> Option<Command> {
    let mut next: Option<FilterState> = None;

    ui.horizontal(|ui| {
        ui.label(RichText::new(icons::MAGNIFYING_GLASS).color(theme::TEXT_DIM));
        let mut term = filter.search_term.clone();
        let edit = egui::TextEdit::singleline(&mut term)
            .hint_text("Search code or name")
            .desired_width(f32::INFINITY);
        if ui.add(edit).changed() {
            next = Some(filter.with_search(term));
        }
    });

    ui.add_space(4.0);
    ui.horizontal_wrapped(|ui| {
        for &resource_type in ResourceType::all() {
            let on = filter.resource_types.contains(&resource_type);
            let text = format!(
                "{} {} ({})",
                resource_type.icon(),
                resource_type.label(),
                stats.count_for(resource_type)
            );
            if ui.selectable_label(on, text).clicked() {
                next = Some(filter.with_type_toggled(resource_type));
            }
        }
    });

    ui.horizontal_wrapped(|ui| {
        let mut only_over = filter.show_only_overallocated;
        if ui
            .checkbox(&mut only_over, format!("Overallocated ({})", stats.overallocated))
            .changed()
        {
            next = Some(filter.with_only_overallocated(only_over));
        }
        let mut only_assigned = filter.show_only_with_assignments;
        if ui
            .checkbox(&mut only_assigned, format!("With assignments ({})", stats.with_assignments))
            .changed()
        {
            next = Some(filter.with_only_assigned(only_assigned));
        }
    });

    if !pools.is_empty() {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Pools").small().color(theme::TEXT_DIM));
            for pool in pools {
                let short: String = pool.to_string().chars().take(8).collect();
                if ui
                    .selectable_label(filter.pool_ids.contains(pool), short)
                    .on_hover_text(pool.to_string())
                    .clicked()
                {
                    next = Some(filter.with_pool_toggled(*pool));
                }
            }
        });
    }

    let mut clear = false;
    ui.horizontal(|ui| {
        ui.label(
            RichText::new(format!("{} resources", stats.total))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(filter.has_active_filters(), egui::Button::new("Clear filters").small())
                .clicked()
            {
                clear = true;
            }
        });
    });

    if clear {
        Some(Command::ClearFilters)
    } else {
        next.map(Command::SetFilter)
    }
}
