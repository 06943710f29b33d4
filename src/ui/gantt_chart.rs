use chrono::NaiveDate;
use egui::{Align2, Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::model::lane::ResourceLane;
use crate::model::layout::{bar_geometry, column_index, stack_rows, sub_row_count, BarCommand, StackedAssignment};
use crate::model::resource::{format_optional_date, format_optional_float, Assignment};
use crate::model::timeline::{GanttViewConfig, MonthGroup, TimelineColumn};
use crate::state::Command;
use crate::ui::theme;

/// Width of the resource label gutter left of the first column.
pub const LABEL_WIDTH: f32 = 180.0;

/// Vertical placement of one lane inside the grid body.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneRows {
    pub resource_id: Uuid,
    /// Offset from the top of the body.
    pub top: f32,
    /// Height of the bar area, without the utilization row.
    pub bars_height: f32,
    pub height: f32,
    pub stacked: Vec<StackedAssignment>,
}

/// Stack every lane's visible bars and lay the lanes out top to bottom.
///
/// Assignments that touch no column take no sub-row.
pub fn lane_rows(
    lanes: &[ResourceLane],
    columns: &[TimelineColumn],
    row_height: f32,
    show_utilization: bool,
) -> Vec<LaneRows> {
    let util = if show_utilization { theme::UTIL_ROW_HEIGHT } else { 0.0 };
    let mut top = 0.0;
    lanes
        .iter()
        .map(|lane| {
            let visible: Vec<Assignment> = lane
                .assignments
                .iter()
                .filter(|a| bar_geometry(columns, a, 1.0).is_some())
                .cloned()
                .collect();
            let stacked = stack_rows(&visible);
            let stacked_height = sub_row_count(&stacked) as f32 * theme::SUB_ROW_HEIGHT + theme::BAR_INSET * 2.0;
            let bars_height = row_height.max(stacked_height);
            let rows = LaneRows {
                resource_id: lane.resource_id,
                top,
                bars_height,
                height: bars_height + util,
                stacked,
            };
            top += rows.height;
            rows
        })
        .collect()
}

/// Everything the grid needs for one frame.
pub struct GridView<'a> {
    pub config: &'a GanttViewConfig,
    pub columns: &'a [TimelineColumn],
    pub groups: &'a [MonthGroup],
    pub lanes: &'a [ResourceLane],
    pub rows: &'a [LaneRows],
    pub selected_resource: Option<Uuid>,
    pub selected_assignment: Option<Uuid>,
}

/// Render the resource grid (central panel).
pub fn show_gantt_chart(view: &GridView<'_>, ui: &mut Ui) -> Vec<Command> {
    let mut commands = Vec::new();
    let config = view.config;
    let header_height = config.header_height;
    let cw = config.column_width();
    let available = ui.available_size();
    let body_height = view.rows.last().map_or(0.0, |r| r.top + r.height);
    let chart_width = (LABEL_WIDTH + view.columns.len() as f32 * cw).max(available.x);
    let chart_height = (header_height + body_height + 40.0).max(available.y);

    // Ctrl+scroll steps the scale once per wheel event.
    if ui.rect_contains_pointer(ui.max_rect()) {
        let (ctrl, dy) = ui.input(|i| (i.modifiers.ctrl, i.raw_scroll_delta.y));
        if ctrl && dy > 0.0 {
            commands.push(Command::SetScale(config.scale.finer()));
        } else if ctrl && dy < 0.0 {
            commands.push(Command::SetScale(config.scale.coarser()));
        }
    }

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(Vec2::new(chart_width, chart_height), Sense::click());
            let origin = response.rect.min;
            let grid_x = origin.x + LABEL_WIDTH;
            let body_top = origin.y + header_height;
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

            draw_column_backgrounds(&painter, view.columns, grid_x, body_top, cw, chart_height);

            for (i, (lane, rows)) in view.lanes.iter().zip(view.rows).enumerate() {
                let lane_rect = Rect::from_min_size(
                    Pos2::new(origin.x, body_top + rows.top),
                    Vec2::new(chart_width, rows.height),
                );
                let selected = view.selected_resource == Some(lane.resource_id);
                let highlighted = config.highlight_overallocations && lane.has_overallocation();
                draw_lane_background(&painter, lane_rect, i, selected, highlighted);
                draw_lane_label(&painter, lane, lane_rect);

                let lane_response = ui.interact(
                    lane_rect,
                    ui.make_persistent_id(("lane", lane.resource_id)),
                    Sense::click(),
                );

                let bars_top = lane_rect.top() + theme::BAR_INSET;
                for stacked in &rows.stacked {
                    let Some(assignment) = lane
                        .assignments
                        .iter()
                        .find(|a| a.assignment_id == stacked.assignment_id)
                    else {
                        continue;
                    };
                    let Some(geometry) = bar_geometry(view.columns, assignment, cw) else {
                        continue;
                    };
                    let bar_rect = Rect::from_min_size(
                        Pos2::new(
                            grid_x + geometry.left + 1.0,
                            bars_top + stacked.sub_row as f32 * theme::SUB_ROW_HEIGHT + 1.0,
                        ),
                        Vec2::new((geometry.width - 2.0).max(4.0), theme::SUB_ROW_HEIGHT - 2.0),
                    );
                    let is_selected = view.selected_assignment == Some(assignment.assignment_id);
                    let overlaps_overallocation = highlighted && covers_overallocation(lane, assignment);
                    draw_assignment_bar(
                        &painter,
                        lane,
                        assignment,
                        bar_rect,
                        (geometry.clipped_start, geometry.clipped_end),
                        is_selected,
                        overlaps_overallocation,
                    );

                    let bar_response = ui
                        .interact(
                            bar_rect,
                            ui.make_persistent_id(("bar", assignment.assignment_id)),
                            Sense::click(),
                        )
                        .on_hover_ui_at_pointer(|ui| assignment_tooltip(ui, lane, assignment));

                    if bar_response.clicked() {
                        commands.push(Command::SelectResource(Some(lane.resource_id)));
                        commands.push(Command::Bar(BarCommand::Select(assignment.assignment_id)));
                        consumed_click = true;
                    }
                    bar_response.context_menu(|ui| {
                        if ui.button("Delete assignment").clicked() {
                            commands.push(Command::Bar(BarCommand::Delete(assignment.assignment_id)));
                            ui.close_menu();
                        }
                    });
                    if is_selected
                        && !ui.ctx().wants_keyboard_input()
                        && ui.input(|i| i.key_pressed(egui::Key::Delete))
                    {
                        commands.push(Command::Bar(BarCommand::Delete(assignment.assignment_id)));
                    }
                }

                if config.show_utilization {
                    let util_rect = Rect::from_min_max(
                        Pos2::new(grid_x, lane_rect.top() + rows.bars_height),
                        Pos2::new(grid_x + view.columns.len() as f32 * cw, lane_rect.bottom()),
                    );
                    draw_utilization_row(&painter, lane, view.columns, util_rect, cw);
                }

                if lane_response.clicked() && !consumed_click {
                    commands.push(Command::SelectResource(Some(lane.resource_id)));
                    consumed_click = true;
                }
            }

            draw_today_line(&painter, view.columns, grid_x, body_top, cw, chart_height);
            draw_timeline_header(&painter, view, origin, chart_width);

            if view.lanes.is_empty() {
                painter.text(
                    Pos2::new(grid_x + 12.0, body_top + 24.0),
                    Align2::LEFT_CENTER,
                    "No resources match the current filters",
                    theme::font_bar(),
                    theme::TEXT_DIM,
                );
            }

            if response.clicked() && !consumed_click {
                commands.push(Command::SelectResource(None));
            }
        });

    commands
}

fn covers_overallocation(lane: &ResourceLane, assignment: &Assignment) -> bool {
    if assignment.finish_date < assignment.start_date {
        return false;
    }
    lane.daily_utilization
        .range(assignment.start_date..=assignment.finish_date)
        .any(|(_, p)| p.is_overallocated)
}

fn draw_timeline_header(painter: &egui::Painter, view: &GridView<'_>, origin: Pos2, width: f32) {
    let header_height = view.config.header_height;
    let cw = view.config.column_width();
    let grid_x = origin.x + LABEL_WIDTH;
    let half = header_height / 2.0;

    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, header_height)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + header_height),
            Pos2::new(origin.x + width, origin.y + header_height),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );
    painter.text(
        Pos2::new(origin.x + 10.0, origin.y + half),
        Align2::LEFT_CENTER,
        "Resource",
        theme::font_header(),
        theme::TEXT_SECONDARY,
    );

    // Upper band: one cell per month group.
    for group in view.groups {
        let x = grid_x + group.first_column as f32 * cw;
        let cell = Rect::from_min_size(Pos2::new(x, origin.y), Vec2::new(group.span as f32 * cw, half));
        painter.line_segment(
            [cell.left_top(), cell.left_bottom()],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
        painter.with_clip_rect(cell).text(
            Pos2::new(x + 5.0, cell.center().y),
            Align2::LEFT_CENTER,
            &group.label,
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
    }

    // Lower band: one cell per column.
    for (i, col) in view.columns.iter().enumerate() {
        let x = grid_x + i as f32 * cw;
        painter.line_segment(
            [
                Pos2::new(x, origin.y + half),
                Pos2::new(x, origin.y + header_height),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        let color = if col.is_weekend {
            theme::TEXT_DIM
        } else {
            theme::TEXT_SECONDARY
        };
        painter.text(
            Pos2::new(x + cw / 2.0, origin.y + half + half / 2.0),
            Align2::CENTER_CENTER,
            &col.label,
            theme::font_sub(),
            color,
        );
    }
}

fn draw_column_backgrounds(
    painter: &egui::Painter,
    columns: &[TimelineColumn],
    grid_x: f32,
    top: f32,
    cw: f32,
    height: f32,
) {
    for (i, col) in columns.iter().enumerate() {
        let x = grid_x + i as f32 * cw;
        if col.is_weekend {
            painter.rect_filled(
                Rect::from_min_max(Pos2::new(x, top), Pos2::new(x + cw, height + top)),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        painter.line_segment(
            [Pos2::new(x, top), Pos2::new(x, top + height)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn draw_lane_background(painter: &egui::Painter, rect: Rect, index: usize, selected: bool, highlighted: bool) {
    let fill = if selected {
        theme::BG_SELECTED
    } else if highlighted {
        theme::BG_OVERALLOCATED
    } else if index % 2 == 0 {
        theme::BG_LANE_ALT
    } else {
        Color32::TRANSPARENT
    };
    painter.rect_filled(rect, 0.0, fill);
    painter.line_segment(
        [rect.left_bottom(), rect.right_bottom()],
        Stroke::new(0.5, theme::BORDER_SUBTLE),
    );
}

fn draw_lane_label(painter: &egui::Painter, lane: &ResourceLane, lane_rect: Rect) {
    let gutter = Rect::from_min_size(lane_rect.min, Vec2::new(LABEL_WIDTH, lane_rect.height()));
    painter.rect_filled(gutter, 0.0, theme::BG_PANEL);
    painter.line_segment(
        [gutter.right_top(), gutter.right_bottom()],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    let clipped = painter.with_clip_rect(gutter.shrink2(Vec2::new(6.0, 0.0)));
    let y = gutter.top() + 14.0;
    clipped.text(
        Pos2::new(gutter.left() + 8.0, y),
        Align2::LEFT_CENTER,
        lane.resource_type.icon(),
        theme::font_bar(),
        theme::type_color(lane.resource_type),
    );
    clipped.text(
        Pos2::new(gutter.left() + 26.0, y),
        Align2::LEFT_CENTER,
        format!("{}  {}", lane.resource_code, lane.resource_name),
        theme::font_bar(),
        theme::TEXT_PRIMARY,
    );
    if lane.has_overallocation() {
        clipped.text(
            Pos2::new(gutter.right() - 4.0, y),
            Align2::RIGHT_CENTER,
            egui_phosphor::regular::WARNING,
            theme::font_bar(),
            theme::OVERALLOCATED,
        );
    }
}

fn draw_assignment_bar(
    painter: &egui::Painter,
    lane: &ResourceLane,
    assignment: &Assignment,
    bar_rect: Rect,
    (clipped_start, clipped_end): (bool, bool),
    is_selected: bool,
    overallocated: bool,
) {
    let r = theme::BAR_ROUNDING;
    // Square corners mark a bar that continues past the visible range.
    let rounding = Rounding {
        nw: if clipped_start { 0.0 } else { r },
        sw: if clipped_start { 0.0 } else { r },
        ne: if clipped_end { 0.0 } else { r },
        se: if clipped_end { 0.0 } else { r },
    };
    let fill = if assignment.is_critical {
        theme::CRITICAL
    } else {
        theme::type_color(lane.resource_type)
    };

    painter.rect_filled(bar_rect.translate(Vec2::new(1.0, 1.5)), rounding, Color32::from_black_alpha(35));
    painter.rect_filled(bar_rect, rounding, fill);

    if overallocated {
        painter.rect_stroke(bar_rect, rounding, Stroke::new(1.5, theme::OVERALLOCATED));
    }
    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(r + 1.5),
            Stroke::new(2.0, theme::ACCENT),
        );
    }

    if bar_rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(
            format!("{} · {:.0}%", assignment.activity_code, assignment.units * 100.0),
            theme::font_small(),
            theme::TEXT_ON_BAR,
        );
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(bar_rect)
            .galley(Pos2::new(bar_rect.left() + 5.0, text_y), galley, Color32::TRANSPARENT);
    }
}

fn draw_utilization_row(
    painter: &egui::Painter,
    lane: &ResourceLane,
    columns: &[TimelineColumn],
    rect: Rect,
    cw: f32,
) {
    for (i, cell) in lane.column_utilization(columns).into_iter().enumerate() {
        let Some(point) = cell else { continue };
        let x = rect.left() + i as f32 * cw;
        let cell_rect = Rect::from_min_size(Pos2::new(x + 1.0, rect.top() + 2.0), Vec2::new(cw - 2.0, rect.height() - 4.0));
        let color = theme::utilization_color(point.utilization_percent);
        painter.rect_filled(cell_rect, Rounding::same(2.0), color.gamma_multiply(0.55));
        if cw >= 40.0 && point.assigned_hours > 0.0 {
            painter.text(
                cell_rect.center(),
                Align2::CENTER_CENTER,
                format!("{:.0}%", point.utilization_percent),
                theme::font_small(),
                theme::TEXT_PRIMARY,
            );
        }
    }
}

fn draw_today_line(
    painter: &egui::Painter,
    columns: &[TimelineColumn],
    grid_x: f32,
    top: f32,
    cw: f32,
    height: f32,
) {
    let today = chrono::Local::now().date_naive();
    let Some(x) = date_x(columns, today, cw) else {
        return;
    };
    let x = grid_x + x;
    painter.line_segment(
        [Pos2::new(x, top), Pos2::new(x, top + height)],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}

/// Horizontal offset of the middle of `date` within the grid.
fn date_x(columns: &[TimelineColumn], date: NaiveDate, cw: f32) -> Option<f32> {
    let idx = column_index(columns, date)?;
    let col = &columns[idx];
    let days = (col.end - col.date).num_days() as f32 + 1.0;
    let offset = (date - col.date).num_days() as f32 + 0.5;
    Some(idx as f32 * cw + offset / days * cw)
}

fn assignment_tooltip(ui: &mut Ui, lane: &ResourceLane, a: &Assignment) {
    ui.strong(format!("{}  {}", a.activity_code, a.activity_name));
    ui.label(format!(
        "{} → {}",
        a.start_date.format("%d/%m/%Y"),
        a.finish_date.format("%d/%m/%Y"),
    ));
    ui.label(format!(
        "{}: {:.0}% ({:.1} h/day)",
        lane.resource_code,
        a.units * 100.0,
        a.units * lane.capacity_per_day
    ));
    if a.is_critical {
        ui.colored_label(theme::CRITICAL, "Critical path");
    }
    ui.separator();
    ui.label(format!("Early start: {}", format_optional_date(a.early_start)));
    ui.label(format!("Late finish: {}", format_optional_date(a.late_finish)));
    ui.label(format!("Total float: {}", format_optional_float(a.total_float)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lane::build_lane;
    use crate::model::resource::{Resource, ResourceType};
    use crate::model::timeline::{build_columns, DateRange, TimelineScale};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    #[test]
    fn lanes_grow_with_overlapping_bars() {
        let range = DateRange::new(d(2), d(15)).unwrap();
        let crane = Resource::new("CR", "Crane", ResourceType::Equipment);
        let rigger = Resource::new("RG", "Rigger", ResourceType::Labor);
        let lanes = vec![
            build_lane(
                &crane,
                vec![
                    Assignment::new("A", d(3), d(6), 1.0),
                    Assignment::new("B", d(5), d(9), 0.5),
                ],
                &range,
            ),
            build_lane(&rigger, vec![], &range),
        ];

        let columns = build_columns(d(2), d(15), TimelineScale::Days).unwrap();
        let rows = lane_rows(&lanes, &columns, 30.0, false);
        let stacked = 2.0 * theme::SUB_ROW_HEIGHT + 2.0 * theme::BAR_INSET;
        assert_eq!(rows[0].top, 0.0);
        assert_eq!(rows[0].height, stacked);
        assert_eq!(rows[1].top, stacked);
        assert_eq!(rows[1].height, 30.0);

        let with_util = lane_rows(&lanes, &columns, 30.0, true);
        assert_eq!(with_util[1].top, stacked + theme::UTIL_ROW_HEIGHT);
        assert_eq!(with_util[1].bars_height, 30.0);
    }

    #[test]
    fn off_screen_assignments_take_no_sub_row() {
        let range = DateRange::new(d(2), d(15)).unwrap();
        let crane = Resource::new("CR", "Crane", ResourceType::Equipment);
        let january = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let lane = build_lane(
            &crane,
            vec![
                Assignment::new("OLD-1", january(5), january(20), 1.0),
                Assignment::new("OLD-2", january(10), january(25), 1.0),
                Assignment::new("NOW", d(4), d(6), 1.0),
            ],
            &range,
        );
        let columns = build_columns(d(2), d(15), TimelineScale::Days).unwrap();

        let rows = lane_rows(std::slice::from_ref(&lane), &columns, 30.0, false);
        assert_eq!(rows[0].stacked.len(), 1);
        assert_eq!(rows[0].stacked[0].sub_row, 0);
        assert_eq!(rows[0].height, 30.0);
    }

    #[test]
    fn today_marker_sits_inside_its_column() {
        let cols = build_columns(d(2), d(22), TimelineScale::Weeks).unwrap();
        // Thursday of the second week.
        let x = date_x(&cols, d(12), 84.0).unwrap();
        assert!(x > 84.0 && x < 168.0);
        assert!(date_x(&cols, d(28), 84.0).is_none());
    }
}
