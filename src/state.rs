//! View state of the resource timeline and its single mutation entry point.
//!
//! UI code never mutates [`ViewState`] directly: it returns [`Command`]s,
//! the application feeds them to [`ViewState::dispatch`] and performs the
//! [`Effect`]s that come back.

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::model::filter::FilterState;
use crate::model::layout::{AssignmentChange, BarCommand};
use crate::model::leveling::{LevelingOptions, LevelingRequest, LevelingState, LevelingTicket};
use crate::model::timeline::{DateRange, GanttViewConfig, TimelineScale};

/// Changes to the leveling window.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelingCommand {
    Open,
    Close,
    SetOptions(LevelingOptions),
    Request(LevelingRequest),
    ToggleShift(Uuid),
}

/// Everything the user can ask the view to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetScale(TimelineScale),
    SetRange(NaiveDate, NaiveDate),
    ShiftRange(i64),
    ToggleUtilization,
    ToggleOverallocationHighlight,
    SetFilter(FilterState),
    ClearFilters,
    SelectResource(Option<Uuid>),
    Bar(BarCommand),
    Retry,
    Leveling(LevelingCommand),
    ExportUtilization,
    OpenSettingsFolder,
    ShowAbout,
}

/// Work the application must perform after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The visible range changed: assignments must be requested for it.
    FetchAssignments,
    /// The selected resource, range or granularity changed.
    FetchHistogram,
    /// Re-issue every query, including ones that failed.
    Refetch,
    DeleteAssignment(AssignmentChange),
    Leveling(LevelingTicket),
    ExportUtilization,
    OpenSettingsFolder,
    ShowAbout,
    /// Tell the user something went wrong without touching the data.
    Notify(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub config: GanttViewConfig,
    pub filter: FilterState,
    pub selected_resource: Option<Uuid>,
    pub selected_assignment: Option<Uuid>,
    pub leveling: LevelingState,
    revision: u64,
}

impl ViewState {
    pub fn new(range: DateRange, scale: TimelineScale) -> Self {
        Self {
            config: GanttViewConfig::new(range, scale),
            filter: FilterState::default(),
            selected_resource: None,
            selected_assignment: None,
            leveling: LevelingState::default(),
            revision: 0,
        }
    }

    /// Bumped whenever an input of the derived grid changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        debug!(?command, "dispatch");
        match command {
            Command::SetScale(scale) => {
                if scale == self.config.scale {
                    return Vec::new();
                }
                self.config.set_scale(scale);
                self.touch();
                self.histogram_effect()
            }
            Command::SetRange(start, end) => match self.config.set_range(start, end) {
                Ok(()) => {
                    self.touch();
                    self.range_effects()
                }
                Err(err) => vec![Effect::Notify(err.to_string())],
            },
            Command::ShiftRange(0) => Vec::new(),
            Command::ShiftRange(days) => {
                self.config.shift_days(days);
                self.touch();
                self.range_effects()
            }
            Command::ToggleUtilization => {
                self.config.toggle_utilization();
                self.touch();
                Vec::new()
            }
            Command::ToggleOverallocationHighlight => {
                self.config.toggle_overallocation_highlight();
                self.touch();
                Vec::new()
            }
            Command::SetFilter(filter) => {
                if filter != self.filter {
                    self.filter = filter;
                    self.touch();
                }
                Vec::new()
            }
            Command::ClearFilters => {
                if self.filter.has_active_filters() {
                    self.filter = self.filter.cleared();
                    self.touch();
                }
                Vec::new()
            }
            Command::SelectResource(id) => {
                // A bar click re-selects its bar right after this.
                self.selected_assignment = None;
                if id == self.selected_resource {
                    return Vec::new();
                }
                self.selected_resource = id;
                self.histogram_effect()
            }
            Command::Bar(BarCommand::Select(id)) => {
                self.selected_assignment = Some(id);
                Vec::new()
            }
            Command::Bar(bar @ BarCommand::Delete(id)) => {
                if self.selected_assignment == Some(id) {
                    self.selected_assignment = None;
                }
                bar.change().map(Effect::DeleteAssignment).into_iter().collect()
            }
            Command::Retry => vec![Effect::Refetch],
            Command::Leveling(cmd) => self.dispatch_leveling(cmd),
            Command::ExportUtilization => vec![Effect::ExportUtilization],
            Command::OpenSettingsFolder => vec![Effect::OpenSettingsFolder],
            Command::ShowAbout => vec![Effect::ShowAbout],
        }
    }

    fn dispatch_leveling(&mut self, command: LevelingCommand) -> Vec<Effect> {
        match command {
            LevelingCommand::Open => self.leveling.open = true,
            LevelingCommand::Close => self.leveling.open = false,
            LevelingCommand::SetOptions(options) => self.leveling.options = options,
            LevelingCommand::ToggleShift(id) => self.leveling.toggle_shift(id),
            LevelingCommand::Request(LevelingRequest::Apply) if self.leveling.selected_shifts.is_empty() => {
                return vec![Effect::Notify("Select at least one shift to apply".into())];
            }
            LevelingCommand::Request(request) => {
                return vec![Effect::Leveling(self.leveling.begin(request))];
            }
        }
        Vec::new()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn range_effects(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::FetchAssignments];
        effects.extend(self.histogram_effect());
        effects
    }

    fn histogram_effect(&self) -> Vec<Effect> {
        if self.selected_resource.is_some() {
            vec![Effect::FetchHistogram]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout::ChangeKind;
    use crate::model::leveling::RequestStatus;
    use crate::model::resource::ResourceType;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn state() -> ViewState {
        ViewState::new(DateRange::new(d(2), d(15)).unwrap(), TimelineScale::Days)
    }

    #[test]
    fn range_change_requests_assignments() {
        let mut s = state();
        let effects = s.dispatch(Command::SetRange(d(10), d(12)));
        assert_eq!(effects, vec![Effect::FetchAssignments]);
        assert_eq!(s.config.start_date(), d(10));
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn inverted_range_is_rejected_and_state_kept() {
        let mut s = state();
        let effects = s.dispatch(Command::SetRange(d(15), d(2)));
        assert!(matches!(effects.as_slice(), [Effect::Notify(_)]));
        assert_eq!(s.config.start_date(), d(2));
        assert_eq!(s.config.end_date(), d(15));
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn histogram_follows_selection() {
        let mut s = state();
        let id = Uuid::new_v4();
        assert_eq!(s.dispatch(Command::SelectResource(Some(id))), vec![Effect::FetchHistogram]);
        assert!(s.dispatch(Command::SelectResource(Some(id))).is_empty());
        assert_eq!(
            s.dispatch(Command::ShiftRange(7)),
            vec![Effect::FetchAssignments, Effect::FetchHistogram]
        );
        assert_eq!(s.dispatch(Command::SetScale(TimelineScale::Weeks)), vec![Effect::FetchHistogram]);
    }

    #[test]
    fn unchanged_inputs_keep_the_revision() {
        let mut s = state();
        s.dispatch(Command::SetScale(TimelineScale::Days));
        s.dispatch(Command::SetFilter(FilterState::default()));
        s.dispatch(Command::ClearFilters);
        s.dispatch(Command::ShiftRange(0));
        assert_eq!(s.revision(), 0);

        s.dispatch(Command::SetFilter(FilterState::default().with_type_toggled(ResourceType::Material)));
        assert_eq!(s.revision(), 1);
        s.dispatch(Command::ClearFilters);
        assert!(!s.filter.has_active_filters());
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn delete_bar_emits_change_and_clears_selection() {
        let mut s = state();
        let id = Uuid::new_v4();
        s.dispatch(Command::Bar(BarCommand::Select(id)));
        assert_eq!(s.selected_assignment, Some(id));
        let effects = s.dispatch(Command::Bar(BarCommand::Delete(id)));
        assert_eq!(
            effects,
            vec![Effect::DeleteAssignment(AssignmentChange {
                assignment_id: id,
                kind: ChangeKind::Delete,
            })]
        );
        assert_eq!(s.selected_assignment, None);
    }

    #[test]
    fn moving_the_selection_disarms_the_bar() {
        let mut s = state();
        let lane = Uuid::new_v4();
        let bar = Uuid::new_v4();
        s.dispatch(Command::SelectResource(Some(lane)));
        s.dispatch(Command::Bar(BarCommand::Select(bar)));
        assert_eq!(s.selected_assignment, Some(bar));

        s.dispatch(Command::SelectResource(None));
        assert_eq!(s.selected_assignment, None);

        s.dispatch(Command::SelectResource(Some(lane)));
        s.dispatch(Command::Bar(BarCommand::Select(bar)));
        s.dispatch(Command::SelectResource(Some(Uuid::new_v4())));
        assert_eq!(s.selected_assignment, None);

        // Clicking empty space in the same lane also drops the bar.
        s.dispatch(Command::Bar(BarCommand::Select(bar)));
        let current = s.selected_resource;
        s.dispatch(Command::SelectResource(current));
        assert_eq!(s.selected_assignment, None);
    }

    #[test]
    fn leveling_requests_mark_loading() {
        let mut s = state();
        s.dispatch(Command::Leveling(LevelingCommand::Open));
        assert!(s.leveling.open);
        let effects = s.dispatch(Command::Leveling(LevelingCommand::Request(LevelingRequest::Compare)));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Leveling(t)] if t.request == LevelingRequest::Compare
        ));
        assert_eq!(s.leveling.comparison, RequestStatus::Loading);
    }

    #[test]
    fn apply_without_selection_is_refused() {
        let mut s = state();
        let effects = s.dispatch(Command::Leveling(LevelingCommand::Request(LevelingRequest::Apply)));
        assert!(matches!(effects.as_slice(), [Effect::Notify(_)]));
        assert_eq!(s.leveling.apply, RequestStatus::Idle);

        s.dispatch(Command::Leveling(LevelingCommand::ToggleShift(Uuid::new_v4())));
        let effects = s.dispatch(Command::Leveling(LevelingCommand::Request(LevelingRequest::Apply)));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Leveling(t)] if t.request == LevelingRequest::Apply
        ));
    }

    #[test]
    fn toggles_flip_view_flags() {
        let mut s = state();
        s.dispatch(Command::ToggleUtilization);
        s.dispatch(Command::ToggleOverallocationHighlight);
        assert!(!s.config.show_utilization);
        assert!(!s.config.highlight_overallocations);
        assert_eq!(s.revision(), 2);
    }
}
