use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{
    ApiClient, ApiEvent, ApiWorker, AssignmentsKey, HistogramKey, LevelingOutcome, QueryCell,
    Resolution, ResourceHistogram, ResourcesKey,
};
use crate::config::AppSettings;
use crate::error::Result;
use crate::model::filter::{self, FilterStats};
use crate::model::lane::{build_lanes, ResourceLane};
use crate::model::leveling::{LevelingRequest, LevelingState, LevelingTicket};
use crate::model::resource::{AssignmentRecord, Resource};
use crate::model::timeline::{month_groups, DateRange, MonthGroup, TimelineColumn};
use crate::model::utilization::{bucketize, summarize, Granularity};
use crate::state::{Command, Effect, ViewState};
use crate::ui;
use crate::ui::gantt_chart::{lane_rows, GridView, LaneRows};
use crate::ui::histogram::{HistogramPanel, HistogramSource};
use crate::ui::toasts::Toasts;

type AssignmentCell = QueryCell<AssignmentsKey, Vec<AssignmentRecord>>;

/// An assignment removed from the view while its delete request is in flight.
#[derive(Debug, Clone, PartialEq)]
struct PendingDelete {
    resource_id: Uuid,
    index: usize,
    record: AssignmentRecord,
}

/// Inputs the derived grid was last built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DerivedKey {
    view: u64,
    data: u64,
}

/// Grid data rebuilt from scratch whenever its inputs change.
#[derive(Debug, Default)]
struct Derived {
    key: Option<DerivedKey>,
    columns: Vec<TimelineColumn>,
    groups: Vec<MonthGroup>,
    lanes: Vec<ResourceLane>,
    filtered: Vec<ResourceLane>,
    rows: Vec<LaneRows>,
    stats: FilterStats,
    pools: BTreeSet<Uuid>,
}

/// Main application state.
pub struct ResourceGanttApp {
    settings: AppSettings,
    view: ViewState,
    worker: ApiWorker,
    resources: QueryCell<ResourcesKey, Vec<Resource>>,
    assignments: HashMap<Uuid, AssignmentCell>,
    histogram: QueryCell<HistogramKey, ResourceHistogram>,
    pending_deletes: HashMap<Uuid, PendingDelete>,
    /// Bumped whenever any query data changes.
    data_revision: u64,
    derived: Derived,
    toasts: Toasts,
    status_message: String,
    show_about: bool,
}

impl ResourceGanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Result<Self> {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);
        ui::theme::apply_theme(&cc.egui_ctx);

        let client = ApiClient::new(
            settings.api_base_url.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        let worker = ApiWorker::new(client)?.with_repaint(cc.egui_ctx.clone());

        let today = chrono::Local::now().date_naive();
        let last = today + chrono::Duration::days(i64::from(settings.default_range_days.max(1)) - 1);
        let range = DateRange::new(today, last)?;
        let view = ViewState::new(range, settings.default_scale);

        let mut app = Self {
            settings,
            view,
            worker,
            resources: QueryCell::new(),
            assignments: HashMap::new(),
            histogram: QueryCell::new(),
            pending_deletes: HashMap::new(),
            data_revision: 0,
            derived: Derived::default(),
            toasts: Toasts::default(),
            status_message: "Ready".to_string(),
            show_about: false,
        };
        app.request_resources();
        Ok(app)
    }

    // --- Queries ---

    fn request_resources(&mut self) {
        let Some(program_id) = self.settings.program_id else {
            self.status_message = "No program configured".to_string();
            return;
        };
        let key = ResourcesKey { program_id };
        if self.resources.request(key) {
            self.worker.fetch_resources(key);
        }
    }

    fn request_assignments(&mut self) {
        let range = self.view.config.range();
        let ids: Vec<Uuid> = self
            .resources
            .data()
            .map(|r| r.iter().map(|r| r.id).collect())
            .unwrap_or_default();
        for resource_id in ids {
            let key = AssignmentsKey { resource_id, range };
            if self.assignments.entry(resource_id).or_default().request(key) {
                self.worker.fetch_assignments(key);
            }
        }
    }

    fn request_histogram(&mut self) {
        let Some(resource_id) = self.view.selected_resource else {
            return;
        };
        let key = HistogramKey {
            resource_id,
            range: self.view.config.range(),
            granularity: Granularity::from(self.view.config.scale),
        };
        if self.histogram.request(key) {
            self.worker.fetch_histogram(key);
        }
    }

    /// Re-issue every wanted query, failed ones included.
    fn refetch_all(&mut self) {
        if self.resources.data().is_none() {
            self.request_resources();
        } else if let Some(key) = self.resources.invalidate() {
            self.worker.fetch_resources(key);
        }
        for cell in self.assignments.values_mut() {
            if let Some(key) = cell.invalidate() {
                self.worker.fetch_assignments(key);
            }
        }
        if let Some(key) = self.histogram.invalidate() {
            self.worker.fetch_histogram(key);
        }
    }

    // --- Responses ---

    fn handle_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Resources { key, result } => {
                let outcome = result.as_ref().map(Vec::len).map_err(ToString::to_string);
                if self.resources.resolve(key, result) == Resolution::Superseded {
                    debug!("dropped superseded resource list");
                    return;
                }
                self.data_revision += 1;
                match outcome {
                    Ok(count) => {
                        self.status_message = format!("Loaded {count} resources");
                        let ids: BTreeSet<Uuid> = self
                            .resources
                            .data()
                            .map(|r| r.iter().map(|r| r.id).collect())
                            .unwrap_or_default();
                        self.assignments.retain(|id, _| ids.contains(id));
                        self.request_assignments();
                    }
                    Err(message) => {
                        warn!(%message, "resource fetch failed");
                        // Without data the central panel shows the error and a retry button.
                        if self.resources.data().is_some() {
                            self.toasts.error(format!("Could not refresh resources: {message}"));
                        }
                    }
                }
            }
            ApiEvent::Assignments { key, result } => {
                let failed = result.as_ref().err().map(ToString::to_string);
                let cell = self.assignments.entry(key.resource_id).or_default();
                if cell.resolve(key, result) == Resolution::Superseded {
                    debug!(resource = %key.resource_id, "dropped superseded assignments");
                    return;
                }
                self.data_revision += 1;
                if let Some(message) = failed {
                    warn!(resource = %key.resource_id, %message, "assignment fetch failed");
                    self.toasts.error(format!("Could not load assignments: {message}"));
                }
            }
            ApiEvent::Histogram { key, result } => {
                let failed = result.as_ref().err().map(ToString::to_string);
                if self.histogram.resolve(key, result) == Resolution::Superseded {
                    return;
                }
                if let Some(message) = failed {
                    warn!(resource = %key.resource_id, %message, "histogram fetch failed");
                    self.toasts.error(format!("Could not load histogram: {message}"));
                }
            }
            ApiEvent::AssignmentDeleted {
                assignment_id,
                result,
                ..
            } => {
                let Some(pending) = self.pending_deletes.remove(&assignment_id) else {
                    return;
                };
                match result {
                    Ok(()) => {
                        info!(assignment = %assignment_id, "assignment deleted");
                        self.status_message = "Assignment deleted".to_string();
                    }
                    Err(err) => {
                        warn!(assignment = %assignment_id, error = %err, "delete failed; restoring");
                        restore_record(&mut self.assignments, pending);
                        self.data_revision += 1;
                        self.toasts.error(format!("Delete failed: {err}"));
                    }
                }
            }
            ApiEvent::Leveling { ticket, result } => {
                let result = result.map_err(|e| e.to_string());
                if let Err(message) = &result {
                    warn!(request = ticket.request.label(), %message, "leveling request failed");
                }
                if let Some(count) = finish_leveling(&mut self.view.leveling, ticket, result) {
                    self.status_message = format!("Applied {count} leveling shifts");
                    self.toasts.info(format!("Applied {count} shifts; reloading"));
                    self.refetch_all();
                }
            }
        }
    }

    // --- Effects ---

    fn run_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            for effect in self.view.dispatch(command) {
                self.perform(effect);
            }
        }
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::FetchAssignments => self.request_assignments(),
            Effect::FetchHistogram => self.request_histogram(),
            Effect::Refetch => self.refetch_all(),
            Effect::DeleteAssignment(change) => {
                match remove_record(&mut self.assignments, change.assignment_id) {
                    Some(pending) => {
                        self.worker.delete_assignment(pending.resource_id, change.assignment_id);
                        self.pending_deletes.insert(change.assignment_id, pending);
                        self.data_revision += 1;
                        self.status_message = "Deleting assignment...".to_string();
                    }
                    None => debug!(assignment = %change.assignment_id, "nothing to delete"),
                }
            }
            Effect::Leveling(ticket) => match self.settings.program_id {
                Some(program_id) => self.worker.leveling(
                    ticket,
                    program_id,
                    self.view.leveling.options.clone(),
                    self.view.leveling.shift_ids(),
                ),
                None => {
                    finish_leveling(
                        &mut self.view.leveling,
                        ticket,
                        Err("No program configured".to_string()),
                    );
                }
            },
            Effect::ExportUtilization => self.export_utilization(),
            Effect::OpenSettingsFolder => match AppSettings::config_dir() {
                Ok(dir) => {
                    if let Err(err) = open::that(&dir) {
                        self.toasts.error(format!("Could not open {}: {err}", dir.display()));
                    }
                }
                Err(err) => self.toasts.error(err.to_string()),
            },
            Effect::ShowAbout => self.show_about = true,
            Effect::Notify(message) => self.toasts.error(message),
        }
    }

    fn export_utilization(&mut self) {
        if self.derived.filtered.is_empty() {
            self.status_message = "Nothing to export: no visible resources".to_string();
            return;
        }
        let range = self.view.config.range();
        let default_name = format!("utilization-{}-{}.csv", range.start(), range.end());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match crate::io::utilization_export::export_csv(&self.derived.filtered, &self.derived.columns, &path) {
                Ok(rows) => self.status_message = format!("Exported {rows} utilization rows"),
                Err(err) => self.toasts.error(err.to_string()),
            }
        }
    }

    // --- Derived data ---

    fn refresh_derived(&mut self) {
        let key = DerivedKey {
            view: self.view.revision(),
            data: self.data_revision,
        };
        if self.derived.key == Some(key) {
            return;
        }
        let config = &self.view.config;
        let range = config.range();
        let columns = config.columns();
        let groups = month_groups(&columns);
        let resources = self.resources.data().map(Vec::as_slice).unwrap_or_default();
        let by_resource: HashMap<Uuid, Vec<AssignmentRecord>> = self
            .assignments
            .iter()
            .filter_map(|(id, cell)| cell.data().map(|records| (*id, records.clone())))
            .collect();
        let lanes = build_lanes(resources, &by_resource, &range);
        let filtered = filter::apply(&lanes, &self.view.filter);
        let rows = lane_rows(&filtered, &columns, config.row_height, config.show_utilization);
        debug!(lanes = lanes.len(), visible = filtered.len(), columns = columns.len(), "rebuilt grid");
        self.derived = Derived {
            key: Some(key),
            stats: filter::stats(&lanes),
            pools: filter::known_pools(&lanes),
            columns,
            groups,
            lanes,
            filtered,
            rows,
        };
    }

    fn is_fetching(&self) -> bool {
        self.resources.is_fetching()
            || self.histogram.is_fetching()
            || self.assignments.values().any(QueryCell::is_fetching)
    }

    // --- Panels ---

    fn show_sidebar(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        commands.extend(ui::filter_bar::show_filter_bar(
            &self.view.filter,
            &self.derived.stats,
            &self.derived.pools,
            ui,
        ));
        ui.add_space(4.0);
        ui.separator();
        commands.extend(ui::resource_table::show_resource_table(
            &self.derived.filtered,
            self.view.selected_resource,
            ui,
        ));

        let Some(lane) = self
            .view
            .selected_resource
            .and_then(|id| self.derived.lanes.iter().find(|l| l.resource_id == id))
        else {
            return;
        };
        ui.separator();
        let local;
        let source = match self.histogram.data() {
            Some(h) if !self.histogram.is_stale() => HistogramSource::Service(h),
            _ => {
                let granularity = Granularity::from(self.view.config.scale);
                local = summarize(bucketize(lane.daily_utilization.values(), granularity));
                HistogramSource::Local(&local)
            }
        };
        ui::histogram::show_histogram(
            &HistogramPanel {
                lane,
                source,
                fetching: self.histogram.is_fetching(),
                error: self.histogram.error(),
            },
            ui,
        );
    }

    fn show_central(&self, ui: &mut egui::Ui, commands: &mut Vec<Command>) {
        if self.settings.program_id.is_none() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.heading("No program configured");
                ui.label("Set program_id in settings.json or RESOURCE_GANTT_PROGRAM_ID.");
                if ui.button("Open Settings Folder").clicked() {
                    commands.push(Command::OpenSettingsFolder);
                }
            });
            return;
        }
        if self.resources.is_initial_load() {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.spinner();
                ui.label("Loading resources...");
            });
            return;
        }
        if let (None, Some(message)) = (self.resources.data(), self.resources.error()) {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(
                    egui::RichText::new("Could not load resources")
                        .strong()
                        .color(ui::theme::ERROR_TEXT),
                );
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("Retry").clicked() {
                    commands.push(Command::Retry);
                }
            });
            return;
        }

        commands.extend(ui::toolbar::show_range_bar(&self.view, ui));
        ui.separator();
        let grid = GridView {
            config: &self.view.config,
            columns: &self.derived.columns,
            groups: &self.derived.groups,
            lanes: &self.derived.filtered,
            rows: &self.derived.rows,
            selected_resource: self.view.selected_resource,
            selected_assignment: self.view.selected_assignment,
        };
        commands.extend(ui::gantt_chart::show_gantt_chart(&grid, ui));
    }

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal_centered(|ui| {
            ui.label(
                egui::RichText::new(&self.status_message)
                    .size(11.0)
                    .color(ui::theme::TEXT_SECONDARY),
            );
            if self.is_fetching() {
                ui.spinner();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let dim = |text: String| egui::RichText::new(text).size(10.5).color(ui::theme::TEXT_DIM);
                ui.label(dim(format!("Scale: {}", self.view.config.scale.label())));
                ui.label(dim(" · ".into()));
                ui.label(dim(format!(
                    "Resources: {}/{}",
                    self.derived.filtered.len(),
                    self.derived.stats.total
                )));
                if self.derived.stats.overallocated > 0 {
                    ui.label(dim(" · ".into()));
                    ui.label(
                        egui::RichText::new(format!("{} overallocated", self.derived.stats.overallocated))
                            .size(10.5)
                            .color(ui::theme::OVERALLOCATED),
                    );
                }
            });
        });
    }
}

impl eframe::App for ResourceGanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for event in self.worker.poll() {
            self.handle_event(event);
        }
        self.refresh_derived();

        let mut commands = Vec::new();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            commands.extend(ui::toolbar::show_menu_bar(&self.view, ui));
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| self.show_status_bar(ui));

        egui::SidePanel::left("resource_panel")
            .default_width(self.view.config.sidebar_width)
            .min_width(240.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| self.show_sidebar(ui, &mut commands));

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::same(4.0));
        egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| self.show_central(ui, &mut commands));

        if self.view.leveling.open {
            commands.extend(ui::leveling_panel::show_leveling_window(&self.view.leveling, ctx));
        }
        if self.show_about {
            self.show_about = ui::dialogs::show_about_dialog(ctx, &self.settings.api_base_url);
        }

        self.run_commands(commands);
        self.toasts.show(ctx);
    }
}

/// Take an assignment record out of whichever cell holds it.
fn remove_record(cells: &mut HashMap<Uuid, AssignmentCell>, assignment_id: Uuid) -> Option<PendingDelete> {
    cells.iter_mut().find_map(|(resource_id, cell)| {
        let index = cell.data()?.iter().position(|r| r.id == assignment_id)?;
        let record = cell.data_mut()?.remove(index);
        Some(PendingDelete {
            resource_id: *resource_id,
            index,
            record,
        })
    })
}

/// Put a record back where it was removed from.
fn restore_record(cells: &mut HashMap<Uuid, AssignmentCell>, pending: PendingDelete) {
    if let Some(records) = cells.get_mut(&pending.resource_id).and_then(QueryCell::data_mut) {
        if records.iter().any(|r| r.id == pending.record.id) {
            return;
        }
        let index = pending.index.min(records.len());
        records.insert(index, pending.record);
    }
}

/// Route a leveling response into the window state. Returns the number of
/// applied shifts when an apply succeeded. Superseded answers are dropped.
fn finish_leveling(
    state: &mut LevelingState,
    ticket: LevelingTicket,
    result: std::result::Result<LevelingOutcome, String>,
) -> Option<usize> {
    let unexpected = || format!("unexpected response to {}", ticket.request.label());
    let accepted = match ticket.request {
        LevelingRequest::Preview | LevelingRequest::RunSerial | LevelingRequest::RunParallel => {
            let outcome = result.and_then(|o| match o {
                LevelingOutcome::Result(r) => Ok(r),
                _ => Err(unexpected()),
            });
            state.finish_result(ticket, outcome)
        }
        LevelingRequest::Compare => {
            let outcome = result.and_then(|o| match o {
                LevelingOutcome::Comparison(c) => Ok(c),
                _ => Err(unexpected()),
            });
            state.finish_comparison(ticket, outcome)
        }
        LevelingRequest::Apply => {
            let outcome = result.and_then(|o| match o {
                LevelingOutcome::Applied(n) => Ok(n),
                _ => Err(unexpected()),
            });
            let applied = outcome.as_ref().ok().copied();
            return if state.finish_apply(ticket, outcome) { applied } else { None };
        }
    };
    if !accepted {
        debug!(request = ticket.request.label(), seq = ticket.seq, "dropped superseded leveling response");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leveling::{AlgorithmComparison, LevelingMetrics, RequestStatus};
    use chrono::NaiveDate;

    fn record(resource_id: Uuid, day: u32) -> AssignmentRecord {
        AssignmentRecord {
            id: Uuid::new_v4(),
            activity_id: Uuid::new_v4(),
            resource_id,
            units: 1.0,
            start_date: NaiveDate::from_ymd_opt(2026, 2, day),
            finish_date: NaiveDate::from_ymd_opt(2026, 2, day),
            activity: None,
        }
    }

    fn loaded_cells(resource_id: Uuid, records: Vec<AssignmentRecord>) -> HashMap<Uuid, AssignmentCell> {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
        )
        .unwrap();
        let key = AssignmentsKey { resource_id, range };
        let mut cell = AssignmentCell::new();
        cell.request(key);
        cell.resolve::<String>(key, Ok(records));
        HashMap::from([(resource_id, cell)])
    }

    #[test]
    fn failed_delete_restores_the_record_in_place() {
        let resource_id = Uuid::new_v4();
        let records = vec![record(resource_id, 3), record(resource_id, 4), record(resource_id, 5)];
        let target = records[1].id;
        let mut cells = loaded_cells(resource_id, records.clone());

        let pending = remove_record(&mut cells, target).unwrap();
        assert_eq!(pending.index, 1);
        assert_eq!(cells[&resource_id].data().unwrap().len(), 2);

        restore_record(&mut cells, pending);
        assert_eq!(cells[&resource_id].data(), Some(&records));
    }

    #[test]
    fn removing_unknown_assignment_is_a_no_op() {
        let resource_id = Uuid::new_v4();
        let mut cells = loaded_cells(resource_id, vec![record(resource_id, 3)]);
        assert!(remove_record(&mut cells, Uuid::new_v4()).is_none());
        assert_eq!(cells[&resource_id].data().unwrap().len(), 1);
    }

    #[test]
    fn leveling_failures_surface_in_the_window() {
        let mut state = LevelingState::default();
        let ticket = state.begin(LevelingRequest::RunParallel);
        let applied = finish_leveling(
            &mut state,
            ticket,
            Err("leveling request run_parallel_leveling failed: HTTP 500".into()),
        );
        assert_eq!(applied, None);
        assert!(matches!(state.parallel, RequestStatus::Failed(_)));
        assert_eq!(state.serial, RequestStatus::Idle);
    }

    #[test]
    fn comparison_and_apply_are_routed() {
        let mut state = LevelingState::default();
        let comparison = AlgorithmComparison {
            serial: LevelingMetrics::default(),
            parallel: LevelingMetrics::default(),
            recommendation: "Parallel is faster with equal extension".into(),
        };
        let compare = state.begin(LevelingRequest::Compare);
        finish_leveling(
            &mut state,
            compare,
            Ok(LevelingOutcome::Comparison(comparison.clone())),
        );
        assert_eq!(state.comparison, RequestStatus::Loaded(comparison));

        let apply = state.begin(LevelingRequest::Apply);
        let applied = finish_leveling(&mut state, apply, Ok(LevelingOutcome::Applied(3)));
        assert_eq!(applied, Some(3));
        assert_eq!(state.apply, RequestStatus::Loaded(3));
    }

    #[test]
    fn mismatched_outcome_is_reported_as_failure() {
        let mut state = LevelingState::default();
        let compare = state.begin(LevelingRequest::Compare);
        finish_leveling(&mut state, compare, Ok(LevelingOutcome::Applied(1)));
        assert!(matches!(state.comparison, RequestStatus::Failed(_)));
    }

    #[test]
    fn superseded_apply_does_not_trigger_a_reload() {
        let mut state = LevelingState::default();
        let first = state.begin(LevelingRequest::Apply);
        let _second = state.begin(LevelingRequest::Apply);
        assert_eq!(finish_leveling(&mut state, first, Ok(LevelingOutcome::Applied(2))), None);
        assert!(state.apply.is_loading());
    }
}
